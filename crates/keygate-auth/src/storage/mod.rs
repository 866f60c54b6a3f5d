//! Account model and store traits.
//!
//! Storage backends implement [`AccountStore`]; the in-memory backend
//! lives in [`memory`], the PostgreSQL backend in the
//! `keygate-auth-postgres` crate.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::AuthResult;

pub use memory::MemoryAccountStore;

/// Default page size when the caller supplies no usable limit.
pub const DEFAULT_LIST_LIMIT: i64 = 10;

/// Hard cap on list page size, regardless of input.
pub const MAX_LIST_LIMIT: i64 = 100;

// =============================================================================
// Account
// =============================================================================

/// An end-user account.
///
/// The password hash never crosses the serialization boundary: the field
/// is skipped on serialize, so no response or log sink can carry it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Opaque identifier: 16 random bytes, hex-rendered. Immutable.
    pub id: String,

    /// Unique lowercase email address.
    pub email: String,

    /// bcrypt password hash.
    #[serde(default, skip_serializing)]
    pub password_hash: String,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Casual name; defaults to the display name at signup.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,

    /// Profile picture URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,

    /// When the account was created.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,

    /// When the account was last updated.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,

    /// Whether the email address is verified.
    pub verified: bool,

    /// Blocked accounts cannot authenticate.
    pub blocked: bool,
}

impl Account {
    /// Creates an account with a fresh id and current timestamps.
    #[must_use]
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            id: generate_account_id(),
            email: email.into(),
            password_hash: password_hash.into(),
            name: None,
            nickname: None,
            picture: None,
            created_at: now,
            updated_at: now,
            verified: false,
            blocked: false,
        }
    }

    /// Projects the account to its public profile.
    #[must_use]
    pub fn profile(&self) -> AccountProfile {
        AccountProfile {
            sub: self.id.clone(),
            email: self.email.clone(),
            email_verified: self.verified,
            name: self.name.clone(),
            nickname: self.nickname.clone(),
            picture: self.picture.clone(),
        }
    }
}

/// Public profile of an account, as returned by the userinfo endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountProfile {
    /// Subject identifier (the account id).
    pub sub: String,

    /// Email address.
    pub email: String,

    /// Whether the email address is verified.
    pub email_verified: bool,

    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Casual name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,

    /// Profile picture URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

/// Generates an opaque account id: 16 random bytes, hex-rendered.
#[must_use]
pub fn generate_account_id() -> String {
    let mut bytes = [0u8; 16];
    rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
    hex::encode(bytes)
}

/// Normalizes pagination input: non-positive limits become the default,
/// limits above the cap are clamped, negative offsets become zero.
#[must_use]
pub fn clamp_page(limit: i64, offset: i64) -> (i64, i64) {
    let limit = if limit <= 0 {
        DEFAULT_LIST_LIMIT
    } else {
        limit.min(MAX_LIST_LIMIT)
    };
    (limit, offset.max(0))
}

// =============================================================================
// Account Store Trait
// =============================================================================

/// Storage operations for accounts.
///
/// All operations must be safe under parallel calls from arbitrary
/// request handlers. Implementations return owned values; callers can
/// never mutate stored state through a returned reference.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Persists a new account.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if another record holds the same id or
    /// email; `Storage` if the backend fails.
    async fn create(&self, account: &Account) -> AuthResult<()>;

    /// Looks up an account by id. Returns `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the backend fails.
    async fn find_by_id(&self, id: &str) -> AuthResult<Option<Account>>;

    /// Looks up an account by email. Returns `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the backend fails.
    async fn find_by_email(&self, email: &str) -> AuthResult<Option<Account>>;

    /// Updates an existing account and refreshes its `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id is unknown; `Storage` if the backend
    /// fails.
    async fn update(&self, account: &Account) -> AuthResult<()>;

    /// Deletes an account.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the id is unknown; `Storage` if the backend
    /// fails.
    async fn delete(&self, id: &str) -> AuthResult<()>;

    /// Lists accounts ordered by `created_at` descending.
    ///
    /// Pagination input is normalized with [`clamp_page`].
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the backend fails.
    async fn list(&self, limit: i64, offset: i64) -> AuthResult<Vec<Account>>;
}
