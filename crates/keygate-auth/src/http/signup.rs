//! Account registration endpoint (`POST /dbconnections/signup`).

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::{info, warn};

use super::{ApiError, AUTH_DEADLINE, OAuthState, with_deadline};

/// Signup request body.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    /// Email address; becomes the login identifier.
    #[serde(default)]
    pub email: String,
    /// Plaintext password (hashed before storage).
    #[serde(default)]
    pub password: String,
    /// Optional display name.
    #[serde(default)]
    pub name: Option<String>,
}

/// Signup response body.
#[derive(Debug, Serialize)]
pub struct SignupResponse {
    /// The new account's id.
    pub account_id: String,
    /// Stored (lowercased) email.
    pub email: String,
    /// Display name, when provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Whether the email is verified (always true at signup).
    pub email_verified: bool,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Handler for `POST /dbconnections/signup`.
pub async fn signup_handler(
    State(state): State<OAuthState>,
    Json(request): Json<SignupRequest>,
) -> Response {
    if request.email.is_empty() || request.password.is_empty() {
        return ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "email and password are required",
        )
        .into_response();
    }

    let result = with_deadline(
        AUTH_DEADLINE,
        state
            .service
            .signup(&request.email, &request.password, request.name),
    )
    .await;

    match result {
        Ok(account) => {
            info!(account_id = %account.id, "account registration successful");
            let body = SignupResponse {
                account_id: account.id,
                email: account.email,
                name: account.name,
                email_verified: account.verified,
                created_at: account.created_at,
            };
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(e) => {
            warn!(error = %e, "account registration failed");
            ApiError::from(e).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signup_request_defaults() {
        let request: SignupRequest = serde_json::from_str("{}").unwrap();
        assert!(request.email.is_empty());
        assert!(request.password.is_empty());
        assert!(request.name.is_none());
    }

    #[test]
    fn test_signup_response_omits_missing_name() {
        let response = SignupResponse {
            account_id: "abc".to_string(),
            email: "a@x".to_string(),
            name: None,
            email_verified: true,
            created_at: OffsetDateTime::now_utc(),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("name").is_none());
        assert_eq!(json["account_id"], "abc");
        assert_eq!(json["email_verified"], true);
    }
}
