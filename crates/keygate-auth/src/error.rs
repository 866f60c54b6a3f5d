//! Error types shared across the authorization engine.
//!
//! Every component boundary in this crate reports failures through
//! [`AuthError`]. The HTTP layer maps each variant to an OAuth error code
//! and a status; internal messages are for logs only and are never sent
//! to clients verbatim.

/// Errors that can occur during authorization operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// An argument failed shape or range validation.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of the invalid argument.
        message: String,
    },

    /// The requested record does not exist.
    #[error("Not found: {message}")]
    NotFound {
        /// Description of what was missing.
        message: String,
    },

    /// A record with the same unique key already exists.
    #[error("Already exists: {message}")]
    AlreadyExists {
        /// Description of the conflicting key.
        message: String,
    },

    /// The authorization code, PKCE proof, or redirect binding is invalid.
    #[error("Invalid grant: {message}")]
    InvalidGrant {
        /// Description of why the grant is invalid (logs only).
        message: String,
    },

    /// The token could not be parsed, decrypted, or its signature verified.
    #[error("Invalid token: {message}")]
    InvalidToken {
        /// Description of why the token is invalid (logs only).
        message: String,
    },

    /// The token has expired.
    #[error("Token expired")]
    Expired,

    /// The token is not yet valid (`nbf` is in the future).
    #[error("Token not yet valid")]
    NotYetValid,

    /// The request lacks valid authentication credentials.
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Description of the failure (logs only).
        message: String,
    },

    /// The requested grant type is not supported.
    #[error("Unsupported grant type: {grant_type}")]
    UnsupportedGrantType {
        /// The unsupported grant type.
        grant_type: String,
    },

    /// The requested response type is not supported.
    #[error("Unsupported response type: {response_type}")]
    UnsupportedResponseType {
        /// The unsupported response type.
        response_type: String,
    },

    /// The operation was cancelled because its deadline passed.
    #[error("Operation cancelled")]
    Cancelled,

    /// The engine configuration is invalid; fail at startup.
    #[error("Misconfigured: {message}")]
    Misconfigured {
        /// Description of the configuration problem.
        message: String,
    },

    /// A storage backend failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal failure.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `InvalidInput` error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidGrant` error.
    #[must_use]
    pub fn invalid_grant(message: impl Into<String>) -> Self {
        Self::InvalidGrant {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidToken` error.
    #[must_use]
    pub fn invalid_token(message: impl Into<String>) -> Self {
        Self::InvalidToken {
            message: message.into(),
        }
    }

    /// Creates a new `Unauthorized` error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Creates a new `UnsupportedGrantType` error.
    #[must_use]
    pub fn unsupported_grant_type(grant_type: impl Into<String>) -> Self {
        Self::UnsupportedGrantType {
            grant_type: grant_type.into(),
        }
    }

    /// Creates a new `UnsupportedResponseType` error.
    #[must_use]
    pub fn unsupported_response_type(response_type: impl Into<String>) -> Self {
        Self::UnsupportedResponseType {
            response_type: response_type.into(),
        }
    }

    /// Creates a new `Misconfigured` error.
    #[must_use]
    pub fn misconfigured(message: impl Into<String>) -> Self {
        Self::Misconfigured {
            message: message.into(),
        }
    }

    /// Creates a new `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a client error (4xx category).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. }
                | Self::NotFound { .. }
                | Self::AlreadyExists { .. }
                | Self::InvalidGrant { .. }
                | Self::InvalidToken { .. }
                | Self::Expired
                | Self::NotYetValid
                | Self::Unauthorized { .. }
                | Self::UnsupportedGrantType { .. }
                | Self::UnsupportedResponseType { .. }
        )
    }

    /// Returns `true` if this is a server error (5xx category).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Cancelled | Self::Misconfigured { .. } | Self::Storage { .. } | Self::Internal { .. }
        )
    }

    /// Returns `true` if this is a token-related error.
    #[must_use]
    pub fn is_token_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidToken { .. } | Self::Expired | Self::NotYetValid
        )
    }

    /// Returns the OAuth 2.0 error code for this error.
    ///
    /// This is the machine code carried in the `{error, error_description}`
    /// envelope on the wire.
    #[must_use]
    pub fn oauth_error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } | Self::NotFound { .. } => "invalid_request",
            Self::AlreadyExists { .. } => "account_exists",
            Self::InvalidGrant { .. } => "invalid_grant",
            Self::InvalidToken { .. } | Self::Expired | Self::NotYetValid => "unauthorized",
            Self::Unauthorized { .. } => "unauthorized",
            Self::UnsupportedGrantType { .. } => "unsupported_grant_type",
            Self::UnsupportedResponseType { .. } => "unsupported_response_type",
            Self::Cancelled | Self::Misconfigured { .. } | Self::Storage { .. } | Self::Internal { .. } => {
                "server_error"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AuthError::invalid_grant("code already used");
        assert_eq!(err.to_string(), "Invalid grant: code already used");

        let err = AuthError::Expired;
        assert_eq!(err.to_string(), "Token expired");

        let err = AuthError::unsupported_grant_type("password");
        assert_eq!(err.to_string(), "Unsupported grant type: password");
    }

    #[test]
    fn test_error_predicates() {
        let err = AuthError::invalid_grant("bad code");
        assert!(err.is_client_error());
        assert!(!err.is_server_error());

        let err = AuthError::Expired;
        assert!(err.is_client_error());
        assert!(err.is_token_error());

        let err = AuthError::storage("connection refused");
        assert!(err.is_server_error());
        assert!(!err.is_client_error());

        let err = AuthError::Cancelled;
        assert!(err.is_server_error());
    }

    #[test]
    fn test_oauth_error_code() {
        assert_eq!(
            AuthError::invalid_input("x").oauth_error_code(),
            "invalid_request"
        );
        assert_eq!(
            AuthError::already_exists("x").oauth_error_code(),
            "account_exists"
        );
        assert_eq!(
            AuthError::invalid_grant("x").oauth_error_code(),
            "invalid_grant"
        );
        assert_eq!(AuthError::Expired.oauth_error_code(), "unauthorized");
        assert_eq!(AuthError::NotYetValid.oauth_error_code(), "unauthorized");
        assert_eq!(
            AuthError::unsupported_grant_type("x").oauth_error_code(),
            "unsupported_grant_type"
        );
        assert_eq!(
            AuthError::unsupported_response_type("x").oauth_error_code(),
            "unsupported_response_type"
        );
        assert_eq!(AuthError::Cancelled.oauth_error_code(), "server_error");
        assert_eq!(
            AuthError::misconfigured("x").oauth_error_code(),
            "server_error"
        );
    }
}
