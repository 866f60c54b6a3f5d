//! Router assembly and process lifecycle.

use std::sync::Arc;

use axum::Router;
use axum::extract::FromRef;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use keygate_auth::http::{ApiError, OAuthState, accounts, authorize, discovery, signup, token, userinfo};
use keygate_auth::storage::AccountStore;
use keygate_auth::{
    AuthConfig, AuthService, CodeRegistry, MemoryAccountStore, PasswordHasher, TokenService,
};

use crate::config::{ServerConfig, StoreBackend};
use crate::handlers;

/// Sweep interval for the authorization code registry.
const SWEEP_INTERVAL: std::time::Duration = std::time::Duration::from_secs(60);

/// Top-level application state.
#[derive(Clone)]
pub struct AppState {
    /// State shared with the OAuth handlers.
    pub oauth: OAuthState,
}

impl FromRef<AppState> for OAuthState {
    fn from_ref(state: &AppState) -> OAuthState {
        state.oauth.clone()
    }
}

/// Builds the application state and the code registry it owns.
///
/// # Errors
///
/// Fails on a weak token secret or, for the relational backend, an
/// unreachable database — both are startup failures.
pub async fn build_state(config: &ServerConfig) -> anyhow::Result<(AppState, Arc<CodeRegistry>)> {
    let accounts: Arc<dyn AccountStore> = match config.store {
        StoreBackend::Memory => Arc::new(MemoryAccountStore::new()),
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is required"))?;
            let pool = keygate_auth_postgres::connect(url, config.database_max_connections).await?;
            keygate_auth_postgres::ensure_schema(&pool).await?;
            tracing::info!("connected to postgres account store");
            Arc::new(keygate_auth_postgres::PostgresAccountStore::new(pool))
        }
    };

    let auth_config = AuthConfig::default()
        .with_issuer(config.issuer.clone())
        .with_audience(vec![config.issuer.clone()])
        .with_code_lifetime(time::Duration::seconds(config.code_ttl_secs))
        .with_access_token_lifetime(time::Duration::seconds(config.access_token_ttl_secs))
        .with_refresh_token_lifetime(time::Duration::seconds(config.refresh_token_ttl_secs))
        .with_password_hash_cost(config.password_hash_cost);

    let tokens = Arc::new(TokenService::new(
        &config.token_secret,
        auth_config.issuer.clone(),
        auth_config.audience.clone(),
        auth_config.access_token_lifetime,
        auth_config.refresh_token_lifetime,
    )?);

    let registry = Arc::new(CodeRegistry::new(auth_config.code_lifetime));

    let service = Arc::new(AuthService::new(
        accounts,
        PasswordHasher::new(auth_config.password_hash_cost),
        Arc::clone(&registry),
        tokens,
    ));

    let state = AppState {
        oauth: OAuthState {
            service,
            base_url: config.base_url(),
            issuer: config.issuer.clone(),
        },
    };

    Ok((state, registry))
}

/// Builds the full router with the middleware stack.
///
/// Layers apply bottom-up: request ids are set first, tracing spans wrap
/// each request, the id propagates to the response, and panics anywhere
/// in a handler are converted to a `server_error` envelope with the
/// request id preserved in the log record.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/dbconnections/signup", post(signup::signup_handler))
        .route(
            "/authorize",
            get(authorize::authorize_get).post(authorize::authorize_post),
        )
        .route("/oauth/token", post(token::token_handler))
        .route("/userinfo", get(userinfo::userinfo_handler))
        .route("/api/v2/users", get(accounts::list_accounts_handler))
        .route(
            "/.well-known/openid_configuration",
            get(discovery::openid_configuration_handler),
        )
        .fallback(fallback_not_found)
        .method_not_allowed_fallback(fallback_method_not_allowed)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}

async fn fallback_not_found() -> impl IntoResponse {
    ApiError::not_found()
}

async fn fallback_method_not_allowed() -> impl IntoResponse {
    ApiError::method_not_allowed()
}

/// Converts a handler panic into the standard error envelope.
fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| err.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    tracing::error!(panic = %detail, "request handler panicked");

    ApiError::new(
        StatusCode::INTERNAL_SERVER_ERROR,
        "server_error",
        "Internal server error",
    )
    .into_response()
}

/// The Keygate server process.
pub struct Server {
    config: ServerConfig,
}

impl Server {
    /// Creates a server from loaded configuration.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    /// Runs until shutdown. Returns an error for any startup failure or
    /// fatal runtime condition; the binary maps that to a non-zero exit.
    pub async fn run(self) -> anyhow::Result<()> {
        let (state, registry) = build_state(&self.config).await?;

        let sweeper = registry.start_sweeper(SWEEP_INTERVAL);

        let app = build_router(state);
        let listener = tokio::net::TcpListener::bind(&self.config.address).await?;
        tracing::info!(address = %self.config.address, "keygate server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        sweeper.abort();
        tracing::info!("server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
