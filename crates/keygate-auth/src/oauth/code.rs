//! Authorization code issuance and single-use exchange.
//!
//! Codes bind an authenticated account to a client, redirect URI, scope,
//! and PKCE challenge for a short window. A code is redeemable exactly
//! once: consumption removes the record from the registry before any
//! check runs, so concurrent consumers race on a single atomic removal
//! and at most one can win. Failed exchanges leave the code removed,
//! which is the behavior OAuth 2.1 requires after a code has been
//! presented at the token endpoint.

use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use dashmap::DashMap;
use time::{Duration, OffsetDateTime};

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::pkce::{self, PkceChallenge, PkceChallengeMethod};

// =============================================================================
// Authorization Code Record
// =============================================================================

/// A pending authorization code and everything bound to it at issue time.
#[derive(Debug, Clone)]
pub struct AuthorizationCode {
    /// The opaque code value (256-bit random, base64url).
    pub code: String,

    /// Client that initiated the authorization request.
    pub client_id: String,

    /// Redirect URI exactly as requested; must match byte-for-byte at
    /// exchange.
    pub redirect_uri: String,

    /// Granted scope (space-separated).
    pub scope: String,

    /// The authenticated account this code was issued to.
    pub account_id: String,

    /// PKCE challenge the verifier must satisfy at exchange.
    pub code_challenge: PkceChallenge,

    /// PKCE challenge method (always S256).
    pub code_challenge_method: PkceChallengeMethod,

    /// Absolute expiry timestamp.
    pub expires_at: OffsetDateTime,

    /// Whether consumption of this code has begun.
    pub used: bool,
}

impl AuthorizationCode {
    /// Generates a fresh authorization code value.
    ///
    /// 32 bytes from the thread-local CSPRNG, base64url-encoded without
    /// padding (43 characters, 256 bits of entropy).
    #[must_use]
    pub fn generate_code() -> String {
        let mut bytes = [0u8; 32];
        rand::Rng::fill(&mut rand::thread_rng(), &mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Returns `true` if the code has expired at `now`.
    #[must_use]
    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }
}

// =============================================================================
// Code Registry
// =============================================================================

/// In-process registry of live authorization codes.
///
/// Issue and consume are linearizable per code: the map's atomic
/// insert/remove on the code key is the only mutation path, so two
/// concurrent consumes of the same code resolve to exactly one success.
pub struct CodeRegistry {
    codes: DashMap<String, AuthorizationCode>,
    lifetime: Duration,
}

impl CodeRegistry {
    /// Creates a registry whose codes live for `lifetime` after issue.
    #[must_use]
    pub fn new(lifetime: Duration) -> Self {
        Self {
            codes: DashMap::new(),
            lifetime,
        }
    }

    /// Issues a new code bound to the given account and request context.
    ///
    /// The returned value is the only copy of the code; the caller
    /// forwards it to the client via the redirect.
    pub fn issue(
        &self,
        account_id: &str,
        client_id: &str,
        redirect_uri: &str,
        scope: &str,
        challenge: PkceChallenge,
        method: PkceChallengeMethod,
        now: OffsetDateTime,
    ) -> String {
        let code = AuthorizationCode::generate_code();
        let record = AuthorizationCode {
            code: code.clone(),
            client_id: client_id.to_string(),
            redirect_uri: redirect_uri.to_string(),
            scope: scope.to_string(),
            account_id: account_id.to_string(),
            code_challenge: challenge,
            code_challenge_method: method,
            expires_at: now + self.lifetime,
            used: false,
        };

        self.codes.insert(code.clone(), record);
        code
    }

    /// Redeems a code, enforcing the exchange checks in order.
    ///
    /// The record is removed from the registry up front; the removal is
    /// the linearization point, so a code that enters consumption can
    /// never satisfy another exchange, including after a downstream
    /// failure or a cancelled request.
    ///
    /// # Errors
    ///
    /// Every failure maps to `InvalidGrant`: unknown code, expired code,
    /// already-used code, client mismatch, redirect URI mismatch, or a
    /// PKCE verifier that does not satisfy the stored challenge.
    pub fn consume(
        &self,
        code: &str,
        client_id: &str,
        redirect_uri: &str,
        verifier: &str,
        now: OffsetDateTime,
    ) -> AuthResult<String> {
        let (_, mut record) = self
            .codes
            .remove(code)
            .ok_or_else(|| AuthError::invalid_grant("unknown authorization code"))?;

        if record.is_expired(now) {
            return Err(AuthError::invalid_grant("authorization code expired"));
        }

        if record.used {
            return Err(AuthError::invalid_grant("authorization code already used"));
        }
        record.used = true;

        if record.client_id != client_id {
            return Err(AuthError::invalid_grant("client_id mismatch"));
        }

        if record.redirect_uri != redirect_uri {
            return Err(AuthError::invalid_grant("redirect_uri mismatch"));
        }

        if !pkce::verify(&record.code_challenge, verifier, record.code_challenge_method) {
            return Err(AuthError::invalid_grant("PKCE verification failed"));
        }

        Ok(record.account_id)
    }

    /// Removes expired and used residue. Safe to call concurrently with
    /// issue and consume; repeated sweeps are a no-op.
    pub fn sweep(&self, now: OffsetDateTime) -> usize {
        let before = self.codes.len();
        self.codes.retain(|_, record| !record.used && !record.is_expired(now));
        before.saturating_sub(self.codes.len())
    }

    /// Number of live codes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Returns `true` if no codes are live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Starts the periodic sweep task.
    ///
    /// The task runs until the returned handle is aborted; the server
    /// aborts it during shutdown.
    pub fn start_sweeper(self: Arc<Self>, every: std::time::Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(every);
            tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tick.tick().await;
                let removed = self.sweep(OffsetDateTime::now_utc());
                if removed > 0 {
                    tracing::debug!(removed, "swept stale authorization codes");
                }
            }
        })
    }
}
