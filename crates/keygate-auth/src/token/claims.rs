//! Token claim set.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Claims carried by access and refresh tokens.
///
/// Timestamps are numeric (Unix seconds) on the wire, per RFC 7519.
/// Access tokens carry `scope`; refresh tokens omit it — that and the
/// lifetime are the only differences between the two.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Subject: the account id.
    pub sub: String,

    /// Issuer.
    pub iss: String,

    /// Audience list.
    #[serde(default)]
    pub aud: Vec<String>,

    /// Expiration time (Unix seconds).
    pub exp: i64,

    /// Issued at (Unix seconds).
    pub iat: i64,

    /// Not before (Unix seconds).
    pub nbf: i64,

    /// Account email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Account display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Space-separated scope; present on access tokens only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl Claims {
    /// Expiration as an absolute time.
    ///
    /// Returns `None` if `exp` is outside the representable range.
    #[must_use]
    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(self.exp).ok()
    }

    /// Issue instant as an absolute time.
    #[must_use]
    pub fn issued_at(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(self.iat).ok()
    }

    /// Not-before as an absolute time.
    #[must_use]
    pub fn not_before(&self) -> Option<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(self.nbf).ok()
    }
}
