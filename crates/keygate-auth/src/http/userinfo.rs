//! OpenID Connect UserInfo endpoint (`GET /userinfo`).
//!
//! Requires a bearer token in the `Authorization` header with exactly the
//! `Bearer ` prefix. Tokens in the query string are not accepted, and
//! every failure collapses to 401 `unauthorized`.

use axum::Json;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use tracing::warn;

use super::{ApiError, OAuthState, USERINFO_DEADLINE, with_deadline};

/// Handler for `GET /userinfo`.
pub async fn userinfo_handler(State(state): State<OAuthState>, headers: HeaderMap) -> Response {
    let Some(token) = bearer_token(&headers) else {
        return unauthorized("Authorization header with Bearer token required");
    };

    match with_deadline(USERINFO_DEADLINE, state.service.profile(token)).await {
        Ok(profile) => Json(profile).into_response(),
        Err(e) => {
            warn!(error = %e, "userinfo request rejected");
            unauthorized("Authentication required")
        }
    }
}

/// Extracts the bearer token, accepting exactly the `Bearer ` prefix.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?;
    (!token.is_empty()).then_some(token)
}

fn unauthorized(description: &str) -> Response {
    ApiError::new(StatusCode::UNAUTHORIZED, "unauthorized", description).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, value.parse().unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_accepted() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&headers), Some("abc.def.ghi"));
    }

    #[test]
    fn test_missing_header_rejected() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_wrong_shapes_rejected() {
        for value in [
            "abc.def.ghi",
            "bearer abc",
            "BEARER abc",
            "Basic dXNlcjpwdw==",
            "Bearer",
            "Bearer ",
        ] {
            let headers = headers_with(value);
            assert_eq!(bearer_token(&headers), None, "{value:?} must be rejected");
        }
    }
}
