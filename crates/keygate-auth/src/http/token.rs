//! Token endpoint (`POST /oauth/token`).

use axum::Form;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::oauth::token::TokenRequest;

use super::{ApiError, AUTH_DEADLINE, OAuthState, with_deadline};

/// Handler for `POST /oauth/token` (form-urlencoded body).
///
/// Dispatches on `grant_type`; anything outside `authorization_code` and
/// `refresh_token` is `unsupported_grant_type`.
pub async fn token_handler(
    State(state): State<OAuthState>,
    Form(request): Form<TokenRequest>,
) -> Response {
    debug!(grant_type = %request.grant_type, "processing token request");

    match request.grant_type.as_str() {
        "authorization_code" => authorization_code_grant(&state, &request).await,
        "refresh_token" => refresh_token_grant(&state, &request).await,
        other => {
            warn!(grant_type = other, "unsupported grant type");
            ApiError::from(AuthError::unsupported_grant_type(other)).into_response()
        }
    }
}

async fn authorization_code_grant(state: &OAuthState, request: &TokenRequest) -> Response {
    let code = request.code.as_deref().unwrap_or_default();
    let client_id = request.client_id.as_deref().unwrap_or_default();
    let code_verifier = request.code_verifier.as_deref().unwrap_or_default();
    let redirect_uri = request.redirect_uri.as_deref().unwrap_or_default();

    if code.is_empty() || client_id.is_empty() || code_verifier.is_empty() {
        return ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "code, client_id, and code_verifier are required",
        )
        .into_response();
    }

    debug!(
        client_id,
        code_prefix = &code[..code.len().min(8)],
        "attempting authorization code exchange"
    );

    let result = with_deadline(
        AUTH_DEADLINE,
        state
            .service
            .exchange(code, client_id, code_verifier, redirect_uri),
    )
    .await;

    match result {
        Ok(pair) => {
            info!(client_id, "authorization code exchange successful");
            Json(pair).into_response()
        }
        Err(e @ AuthError::Cancelled) => {
            warn!(client_id, error = %e, "authorization code exchange cancelled");
            ApiError::from(e).into_response()
        }
        Err(e) => {
            warn!(client_id, error = %e, "authorization code exchange failed");
            // Everything after parameter validation is an invalid grant.
            ApiError::from(AuthError::invalid_grant(e.to_string())).into_response()
        }
    }
}

async fn refresh_token_grant(state: &OAuthState, request: &TokenRequest) -> Response {
    let Some(refresh_token) = request.refresh_token.as_deref().filter(|t| !t.is_empty()) else {
        return ApiError::new(
            StatusCode::BAD_REQUEST,
            "invalid_request",
            "refresh_token is required",
        )
        .into_response();
    };

    match state.service.refresh(refresh_token) {
        Ok(pair) => {
            info!("token refresh successful");
            Json(pair).into_response()
        }
        Err(e) => {
            warn!(error = %e, "token refresh failed");
            ApiError::from(AuthError::invalid_grant(e.to_string())).into_response()
        }
    }
}
