//! # keygate-auth
//!
//! OAuth 2.1 authorization protocol engine for the Keygate server.
//!
//! This crate provides:
//! - Authorization-code issuance and exchange with mandatory PKCE (S256)
//! - An encrypted token service (JWE over an HMAC-signed JWT)
//! - The account credential subsystem (bcrypt hashing, store traits)
//! - Axum HTTP handlers for the OAuth and OpenID Connect endpoints
//!
//! ## Modules
//!
//! - [`config`] - Engine configuration (issuer, audience, lifetimes)
//! - [`error`] - Error types shared across components
//! - [`http`] - Axum handlers for the HTTP surface
//! - [`oauth`] - PKCE, authorization codes, request/response types
//! - [`password`] - Password hashing and verification
//! - [`service`] - The orchestrating authorization service
//! - [`storage`] - Account model, store traits, in-memory backend
//! - [`token`] - Encrypted token minting and validation

pub mod config;
pub mod error;
pub mod http;
pub mod oauth;
pub mod password;
pub mod service;
pub mod storage;
pub mod token;

pub use config::AuthConfig;
pub use error::AuthError;
pub use oauth::code::{AuthorizationCode, CodeRegistry};
pub use oauth::pkce::{PkceChallenge, PkceChallengeMethod};
pub use password::PasswordHasher;
pub use service::AuthService;
pub use storage::{Account, AccountProfile, AccountStore, MemoryAccountStore};
pub use token::claims::Claims;
pub use token::service::TokenService;

/// Type alias for results across the authorization engine.
pub type AuthResult<T> = Result<T, AuthError>;
