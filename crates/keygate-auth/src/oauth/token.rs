//! Token endpoint request and response types.

use serde::{Deserialize, Serialize};

/// Token request parameters (form-urlencoded body).
///
/// Covers both supported grants; fields not used by a grant stay `None`:
///
/// - `authorization_code`: code, client_id, code_verifier, redirect_uri
/// - `refresh_token`: refresh_token
#[derive(Debug, Clone, Deserialize)]
pub struct TokenRequest {
    /// OAuth 2.0 grant type. A missing value dispatches like an unknown
    /// one.
    #[serde(default)]
    pub grant_type: String,

    /// Authorization code (authorization_code grant).
    #[serde(default)]
    pub code: Option<String>,

    /// Public client identifier (authorization_code grant).
    #[serde(default)]
    pub client_id: Option<String>,

    /// PKCE code verifier (authorization_code grant).
    #[serde(default)]
    pub code_verifier: Option<String>,

    /// Redirect URI; must match the authorization request byte-for-byte.
    #[serde(default)]
    pub redirect_uri: Option<String>,

    /// Refresh token (refresh_token grant).
    #[serde(default)]
    pub refresh_token: Option<String>,

    /// Requested scope (accepted but not renegotiated).
    #[serde(default)]
    pub scope: Option<String>,
}

/// Successful token response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// The encrypted access token.
    pub access_token: String,

    /// The encrypted refresh token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Always "Bearer".
    pub token_type: String,

    /// Access token lifetime in seconds.
    pub expires_in: u64,

    /// Scope granted to the access token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenPair {
    /// Creates a bearer token pair.
    #[must_use]
    pub fn new(access_token: String, refresh_token: String, expires_in: u64, scope: String) -> Self {
        Self {
            access_token,
            refresh_token: Some(refresh_token),
            token_type: "Bearer".to_string(),
            expires_in,
            scope: Some(scope),
        }
    }
}
