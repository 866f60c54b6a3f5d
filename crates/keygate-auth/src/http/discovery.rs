//! OpenID Connect discovery document
//! (`GET /.well-known/openid_configuration`).

use axum::Json;
use axum::extract::State;
use axum::response::IntoResponse;
use serde_json::json;

use super::OAuthState;

/// Handler for `GET /.well-known/openid_configuration`.
///
/// Static synthesis from configuration. The server supports exactly one
/// response type, two grant types, and one PKCE method, and the document
/// advertises nothing else.
pub async fn openid_configuration_handler(State(state): State<OAuthState>) -> impl IntoResponse {
    let base = state.base_url.trim_end_matches('/');

    Json(json!({
        "issuer": state.issuer,
        "authorization_endpoint": format!("{base}/authorize"),
        "token_endpoint": format!("{base}/oauth/token"),
        "userinfo_endpoint": format!("{base}/userinfo"),
        "response_types_supported": ["code"],
        "grant_types_supported": ["authorization_code", "refresh_token"],
        "code_challenge_methods_supported": ["S256"],
    }))
}
