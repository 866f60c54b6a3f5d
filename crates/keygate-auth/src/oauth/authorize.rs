//! Authorization endpoint request types and error redirects.

use serde::Deserialize;
use url::Url;

use crate::oauth::pkce::PkceChallenge;

/// Parameters of an authorization request (RFC 6749 §4.1.1 + PKCE).
///
/// All fields default to empty so a missing parameter is reported by
/// [`AuthorizationRequest::validate`] rather than by the extractor; a
/// missing parameter must produce a redirect (or a 400 body) with a
/// proper OAuth error code, not a framework-level rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthorizationRequest {
    /// Must be "code".
    #[serde(default)]
    pub response_type: String,

    /// Public client identifier.
    #[serde(default)]
    pub client_id: String,

    /// Redirect URI; echoed exactly at code exchange.
    #[serde(default)]
    pub redirect_uri: String,

    /// Requested scope (space-separated).
    #[serde(default)]
    pub scope: String,

    /// Opaque client state, echoed back on every redirect.
    #[serde(default)]
    pub state: String,

    /// PKCE code challenge.
    #[serde(default)]
    pub code_challenge: String,

    /// PKCE challenge method; must be "S256".
    #[serde(default)]
    pub code_challenge_method: String,
}

impl AuthorizationRequest {
    /// Validates the request parameters, most specific rejection first.
    ///
    /// # Errors
    ///
    /// Returns the OAuth error code and description the client should
    /// see. The caller decides between an error redirect and a 400 body
    /// based on whether `redirect_uri` is present.
    pub fn validate(&self) -> Result<(), AuthorizeReject> {
        if self.response_type != "code" {
            return Err(AuthorizeReject {
                code: AuthorizationErrorCode::UnsupportedResponseType,
                description: "only the \"code\" response type is supported",
            });
        }

        if self.client_id.is_empty() || self.redirect_uri.is_empty() || self.code_challenge.is_empty()
        {
            return Err(AuthorizeReject {
                code: AuthorizationErrorCode::InvalidRequest,
                description: "client_id, redirect_uri, and code_challenge are required",
            });
        }

        if self.code_challenge_method != "S256" {
            return Err(AuthorizeReject {
                code: AuthorizationErrorCode::InvalidRequest,
                description: "code_challenge_method must be S256",
            });
        }

        if PkceChallenge::new(self.code_challenge.clone()).is_err() {
            return Err(AuthorizeReject {
                code: AuthorizationErrorCode::InvalidRequest,
                description: "code_challenge must be URL-safe base64 without padding",
            });
        }

        Ok(())
    }
}

/// OAuth error codes the authorization endpoint can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizationErrorCode {
    /// A required parameter is missing or malformed.
    InvalidRequest,
    /// The response type is not "code".
    UnsupportedResponseType,
    /// The server failed while processing the request.
    ServerError,
}

impl AuthorizationErrorCode {
    /// Returns the wire form of the error code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::UnsupportedResponseType => "unsupported_response_type",
            Self::ServerError => "server_error",
        }
    }
}

/// A rejected authorization request: error code plus client-safe text.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizeReject {
    /// The OAuth error code.
    pub code: AuthorizationErrorCode,
    /// Client-safe description.
    pub description: &'static str,
}

/// Builds the success redirect `redirect_uri?code=...[&state=...]`.
///
/// Returns `None` when `redirect_uri` cannot be parsed as an absolute URL.
#[must_use]
pub fn success_redirect_url(redirect_uri: &str, code: &str, state: &str) -> Option<String> {
    let mut url = Url::parse(redirect_uri).ok()?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("code", code);
        if !state.is_empty() {
            query.append_pair("state", state);
        }
    }
    Some(url.into())
}

/// Builds the error redirect with `error` and `error_description`.
///
/// Returns `None` when `redirect_uri` cannot be parsed as an absolute URL.
#[must_use]
pub fn error_redirect_url(
    redirect_uri: &str,
    code: AuthorizationErrorCode,
    description: &str,
    state: &str,
) -> Option<String> {
    let mut url = Url::parse(redirect_uri).ok()?;
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("error", code.as_str());
        query.append_pair("error_description", description);
        if !state.is_empty() {
            query.append_pair("state", state);
        }
    }
    Some(url.into())
}
