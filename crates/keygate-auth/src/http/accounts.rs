//! Account listing endpoint (`GET /api/v2/users`).
//!
//! Auth0-compatible listing route. Password hashes never appear in the
//! response; the summary carries both `user_id` and `account_id` for
//! compatibility with clients expecting either key.

use axum::Json;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::warn;

use crate::storage::Account;

use super::{ApiError, AUTH_DEADLINE, OAuthState, with_deadline};

/// Pagination query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Page size; clamped server-side.
    #[serde(default)]
    pub limit: Option<i64>,
    /// Records to skip.
    #[serde(default)]
    pub offset: Option<i64>,
}

/// One row of the account listing.
#[derive(Debug, Serialize)]
pub struct AccountSummary {
    /// Account id under its legacy key.
    pub user_id: String,
    /// Account id.
    pub account_id: String,
    /// Email address.
    pub email: String,
    /// Display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Whether the email is verified.
    pub email_verified: bool,
    /// Creation timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Last update timestamp.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Account> for AccountSummary {
    fn from(account: Account) -> Self {
        Self {
            user_id: account.id.clone(),
            account_id: account.id,
            email: account.email,
            name: account.name,
            email_verified: account.verified,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Handler for `GET /api/v2/users`.
pub async fn list_accounts_handler(
    State(state): State<OAuthState>,
    Query(params): Query<ListParams>,
) -> Response {
    let limit = params.limit.unwrap_or(0);
    let offset = params.offset.unwrap_or(0);

    match with_deadline(AUTH_DEADLINE, state.service.list_accounts(limit, offset)).await {
        Ok(accounts) => {
            let rows: Vec<AccountSummary> = accounts.into_iter().map(Into::into).collect();
            Json(rows).into_response()
        }
        Err(e) => {
            warn!(error = %e, "failed to list accounts");
            ApiError::from(e).into_response()
        }
    }
}
