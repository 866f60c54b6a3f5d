//! Axum HTTP handlers for the OAuth 2.1 surface.
//!
//! One module per endpoint, mirroring the paths they serve:
//!
//! - [`signup`] — `POST /dbconnections/signup`
//! - [`authorize`] — `GET`/`POST /authorize`
//! - [`token`] — `POST /oauth/token`
//! - [`userinfo`] — `GET /userinfo`
//! - [`accounts`] — `GET /api/v2/users`
//! - [`discovery`] — `GET /.well-known/openid_configuration`

pub mod accounts;
pub mod authorize;
pub mod discovery;
pub mod signup;
pub mod templates;
pub mod token;
pub mod userinfo;

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::AuthResult;
use crate::error::AuthError;
use crate::service::AuthService;

/// Deadline for the authorization, token, and signup endpoints.
pub const AUTH_DEADLINE: Duration = Duration::from_secs(30);

/// Deadline for the userinfo endpoint.
pub const USERINFO_DEADLINE: Duration = Duration::from_secs(10);

/// Shared state for the OAuth handlers.
#[derive(Clone)]
pub struct OAuthState {
    /// The orchestrating service.
    pub service: Arc<AuthService>,
    /// Public base URL used in the discovery document.
    pub base_url: String,
    /// Issuer string advertised by discovery.
    pub issuer: String,
}

/// Wire-level error envelope: `{error, error_description}`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable description. Never discloses whether an account
    /// exists, which credential was wrong, or which PKCE check failed.
    pub error_description: String,
    #[serde(skip)]
    status: StatusCode,
}

impl ApiError {
    /// Creates an error envelope.
    #[must_use]
    pub fn new(status: StatusCode, error: &'static str, description: impl Into<String>) -> Self {
        Self {
            error,
            error_description: description.into(),
            status,
        }
    }

    /// The `method_not_allowed` envelope.
    #[must_use]
    pub fn method_not_allowed() -> Self {
        Self::new(
            StatusCode::METHOD_NOT_ALLOWED,
            "method_not_allowed",
            "Method not allowed",
        )
    }

    /// The `not_found` envelope.
    #[must_use]
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", "Resource not found")
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        let code = err.oauth_error_code();
        let (status, description) = match code {
            // Argument-shape messages are written for clients.
            "invalid_request" => (StatusCode::BAD_REQUEST, err.to_client_message()),
            "account_exists" => (StatusCode::CONFLICT, "Account already exists".to_string()),
            "invalid_grant" => (StatusCode::BAD_REQUEST, "Invalid credentials".to_string()),
            "unauthorized" => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
            ),
            "unsupported_grant_type" => {
                (StatusCode::BAD_REQUEST, "Grant type not supported".to_string())
            }
            "unsupported_response_type" => (
                StatusCode::BAD_REQUEST,
                "Response type not supported".to_string(),
            ),
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };
        Self::new(status, code, description)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

impl AuthError {
    /// Message safe to return for `invalid_request` class errors.
    fn to_client_message(&self) -> String {
        match self {
            Self::InvalidInput { message } => message.clone(),
            _ => "The request is invalid".to_string(),
        }
    }
}

/// Runs an operation under a deadline, surfacing a fired deadline as
/// `Cancelled`.
pub(crate) async fn with_deadline<T, F>(limit: Duration, operation: F) -> AuthResult<T>
where
    F: Future<Output = AuthResult<T>>,
{
    match tokio::time::timeout(limit, operation).await {
        Ok(result) => result,
        Err(_) => Err(AuthError::Cancelled),
    }
}
