//! The authorization orchestrator.
//!
//! Drives the protocol end to end: validates signups, authenticates
//! end-users, mints authorization codes, exchanges codes for token pairs,
//! and resolves bearer tokens back to account profiles. All collaborators
//! are injected at construction; the service holds no global state.

use std::sync::Arc;

use time::OffsetDateTime;

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::authorize::AuthorizationRequest;
use crate::oauth::code::CodeRegistry;
use crate::oauth::pkce::{PkceChallenge, PkceChallengeMethod};
use crate::oauth::token::TokenPair;
use crate::password::PasswordHasher;
use crate::storage::{Account, AccountProfile, AccountStore};
use crate::token::service::TokenService;

/// Minimum accepted password length at signup.
const MIN_PASSWORD_LEN: usize = 8;

/// Orchestrates the OAuth 2.1 authorization flow.
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    hasher: PasswordHasher,
    codes: Arc<CodeRegistry>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    /// Creates the orchestrator from its collaborators.
    #[must_use]
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        hasher: PasswordHasher,
        codes: Arc<CodeRegistry>,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            accounts,
            hasher,
            codes,
            tokens,
        }
    }

    /// The account store.
    #[must_use]
    pub fn accounts(&self) -> &Arc<dyn AccountStore> {
        &self.accounts
    }

    /// The authorization code registry.
    #[must_use]
    pub fn codes(&self) -> &Arc<CodeRegistry> {
        &self.codes
    }

    /// The token service.
    #[must_use]
    pub fn tokens(&self) -> &Arc<TokenService> {
        &self.tokens
    }

    /// Registers a new account.
    ///
    /// Emails are lowercased before storage so uniqueness is
    /// case-insensitive. Accounts are auto-verified at signup.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a missing email, missing password, or a
    /// password shorter than 8 characters; `AlreadyExists` when the
    /// email is taken.
    pub async fn signup(
        &self,
        email: &str,
        password: &str,
        name: Option<String>,
    ) -> AuthResult<Account> {
        let email = email.trim().to_ascii_lowercase();
        if email.is_empty() {
            return Err(AuthError::invalid_input("email is required"));
        }
        if password.is_empty() {
            return Err(AuthError::invalid_input("password is required"));
        }
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AuthError::invalid_input(
                "password must be at least 8 characters",
            ));
        }

        if self.accounts.find_by_email(&email).await?.is_some() {
            return Err(AuthError::already_exists(format!(
                "account with email {email} already exists"
            )));
        }

        let mut account = Account::new(email, self.hasher.hash(password)?);
        account.nickname = name.clone();
        account.name = name;
        account.verified = true;

        // The store re-checks uniqueness under its own lock, so a racing
        // signup still resolves to exactly one winner.
        self.accounts.create(&account).await?;

        tracing::info!(account_id = %account.id, "account registered");
        Ok(account)
    }

    /// Authenticates an end-user by email and password.
    ///
    /// # Errors
    ///
    /// Unknown account, blocked account, and wrong password all collapse
    /// to the same `Unauthorized` so the caller cannot distinguish them.
    pub async fn authenticate(&self, email: &str, password: &str) -> AuthResult<Account> {
        if email.is_empty() || password.is_empty() {
            return Err(AuthError::unauthorized("invalid credentials"));
        }

        let email = email.trim().to_ascii_lowercase();
        let Some(account) = self.accounts.find_by_email(&email).await? else {
            tracing::debug!("authentication failed: unknown account");
            return Err(AuthError::unauthorized("invalid credentials"));
        };

        if account.blocked {
            tracing::debug!(account_id = %account.id, "authentication failed: account blocked");
            return Err(AuthError::unauthorized("invalid credentials"));
        }

        if !self.hasher.compare(&account.password_hash, password) {
            tracing::debug!(account_id = %account.id, "authentication failed: password mismatch");
            return Err(AuthError::unauthorized("invalid credentials"));
        }

        Ok(account)
    }

    /// Authenticates the user and mints an authorization code bound to
    /// the request's client, redirect URI, scope, and PKCE challenge.
    ///
    /// # Errors
    ///
    /// `Unauthorized` on credential failure; `InvalidInput` when the
    /// PKCE parameters do not parse (the HTTP layer validates them
    /// first, but tampered hidden form fields land here).
    pub async fn login(
        &self,
        request: &AuthorizationRequest,
        email: &str,
        password: &str,
    ) -> AuthResult<String> {
        let challenge = PkceChallenge::new(request.code_challenge.clone())?;
        let method = PkceChallengeMethod::parse(&request.code_challenge_method)?;

        let account = self.authenticate(email, password).await?;

        let code = self.codes.issue(
            &account.id,
            &request.client_id,
            &request.redirect_uri,
            &request.scope,
            challenge,
            method,
            OffsetDateTime::now_utc(),
        );

        tracing::info!(
            account_id = %account.id,
            client_id = %request.client_id,
            "authorization code issued"
        );
        Ok(code)
    }

    /// Exchanges an authorization code for a token pair.
    ///
    /// # Errors
    ///
    /// Every failure — consume, account resolution, or minting — maps to
    /// `InvalidGrant`; the code is spent either way.
    pub async fn exchange(
        &self,
        code: &str,
        client_id: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> AuthResult<TokenPair> {
        let account_id = self.codes.consume(
            code,
            client_id,
            redirect_uri,
            code_verifier,
            OffsetDateTime::now_utc(),
        )?;

        let account = self
            .accounts
            .find_by_id(&account_id)
            .await?
            .ok_or_else(|| AuthError::invalid_grant("account no longer exists"))?;

        let pair = self
            .tokens
            .mint_pair(&account.id, &account.email, account.name.as_deref())
            .map_err(|e| {
                tracing::error!(error = %e, "token minting failed after code consume");
                AuthError::invalid_grant("token minting failed")
            })?;

        tracing::info!(account_id = %account.id, client_id, "authorization code exchanged");
        Ok(pair)
    }

    /// Redeems a refresh token for a new pair.
    ///
    /// # Errors
    ///
    /// Propagates the token validation failure.
    pub fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        if refresh_token.is_empty() {
            return Err(AuthError::invalid_input("refresh_token is required"));
        }
        self.tokens.refresh(refresh_token)
    }

    /// Resolves a bearer token to the account profile behind it.
    ///
    /// # Errors
    ///
    /// Any token or lookup failure collapses to `Unauthorized`.
    pub async fn profile(&self, token: &str) -> AuthResult<AccountProfile> {
        if token.is_empty() {
            return Err(AuthError::unauthorized("token is required"));
        }

        let claims = self
            .tokens
            .validate(token)
            .map_err(|e| AuthError::unauthorized(format!("token rejected: {e}")))?;

        let account = self
            .accounts
            .find_by_id(&claims.sub)
            .await?
            .ok_or_else(|| AuthError::unauthorized("subject no longer exists"))?;

        Ok(account.profile())
    }

    /// Lists accounts, newest first.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the backend fails.
    pub async fn list_accounts(&self, limit: i64, offset: i64) -> AuthResult<Vec<Account>> {
        self.accounts.list(limit, offset).await
    }
}
