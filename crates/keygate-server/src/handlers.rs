//! Root and health handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use keygate_auth::AccountStore;

use crate::server::AppState;

/// `GET /` — service banner.
pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "Keygate Server",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

/// `GET /health` — component status map, 503 when degraded.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    // One cheap read proves the store is reachable; for the relational
    // backend this exercises a pooled connection.
    let store_ok = state.oauth.service.accounts().list(1, 0).await.is_ok();

    let status = if store_ok { "ok" } else { "degraded" };
    let code = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let body = json!({
        "status": status,
        "components": {
            "account_store": if store_ok { "ok" } else { "unavailable" },
            "token_service": "ok",
            "code_registry": "ok",
        },
    });

    (code, Json(body))
}
