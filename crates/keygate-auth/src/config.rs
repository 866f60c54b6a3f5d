//! Authorization engine configuration.

use time::Duration;

/// Default access token lifetime (24 hours).
pub const DEFAULT_ACCESS_TOKEN_LIFETIME: Duration = Duration::hours(24);

/// Default refresh token lifetime (7 days).
pub const DEFAULT_REFRESH_TOKEN_LIFETIME: Duration = Duration::days(7);

/// Default authorization code lifetime (10 minutes, per OAuth 2.0 guidance).
pub const DEFAULT_CODE_LIFETIME: Duration = Duration::minutes(10);

/// Configuration for the authorization engine.
///
/// Collaborators receive this at construction; there is no process-global
/// configuration state.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Issuer string placed in the token `iss` claim.
    pub issuer: String,

    /// Audience list placed in the token `aud` claim.
    pub audience: Vec<String>,

    /// Authorization code lifetime.
    pub code_lifetime: Duration,

    /// Access token lifetime.
    pub access_token_lifetime: Duration,

    /// Refresh token lifetime.
    pub refresh_token_lifetime: Duration,

    /// bcrypt cost parameter for password hashing.
    pub password_hash_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: "keygate".to_string(),
            audience: vec!["keygate".to_string()],
            code_lifetime: DEFAULT_CODE_LIFETIME,
            access_token_lifetime: DEFAULT_ACCESS_TOKEN_LIFETIME,
            refresh_token_lifetime: DEFAULT_REFRESH_TOKEN_LIFETIME,
            password_hash_cost: crate::password::DEFAULT_HASH_COST,
        }
    }
}

impl AuthConfig {
    /// Sets the issuer.
    #[must_use]
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    /// Sets the audience list.
    #[must_use]
    pub fn with_audience(mut self, audience: Vec<String>) -> Self {
        self.audience = audience;
        self
    }

    /// Sets the authorization code lifetime.
    #[must_use]
    pub fn with_code_lifetime(mut self, lifetime: Duration) -> Self {
        self.code_lifetime = lifetime;
        self
    }

    /// Sets the access token lifetime.
    #[must_use]
    pub fn with_access_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.access_token_lifetime = lifetime;
        self
    }

    /// Sets the refresh token lifetime.
    #[must_use]
    pub fn with_refresh_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.refresh_token_lifetime = lifetime;
        self
    }

    /// Sets the bcrypt cost parameter.
    #[must_use]
    pub fn with_password_hash_cost(mut self, cost: u32) -> Self {
        self.password_hash_cost = cost;
        self
    }
}
