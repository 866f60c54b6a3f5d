//! Keygate server assembly: configuration, observability, router, and
//! process lifecycle.

pub mod config;
pub mod handlers;
pub mod observability;
pub mod server;

pub use config::{ConfigError, ServerConfig, StoreBackend};
pub use observability::init_tracing;
pub use server::{AppState, Server, build_router};
