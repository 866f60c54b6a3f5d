//! PKCE (Proof Key for Code Exchange) verification.
//!
//! Implements RFC 7636 with the S256 method only. The "plain" method is
//! forbidden per OAuth 2.1.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};

use crate::AuthResult;
use crate::error::AuthError;

// =============================================================================
// PKCE Challenge Method
// =============================================================================

/// PKCE challenge method.
///
/// Only S256 (SHA-256) is supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PkceChallengeMethod {
    /// SHA-256 hash (the only supported method).
    #[default]
    S256,
}

impl PkceChallengeMethod {
    /// Parses a challenge method from its wire form.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for any method other than "S256", including
    /// "plain", which OAuth 2.1 forbids.
    pub fn parse(method: &str) -> AuthResult<Self> {
        match method {
            "S256" => Ok(Self::S256),
            "plain" => Err(AuthError::invalid_input(
                "code_challenge_method \"plain\" is forbidden",
            )),
            other => Err(AuthError::invalid_input(format!(
                "unsupported code_challenge_method: {other}"
            ))),
        }
    }

    /// Returns the method as its wire string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S256 => "S256",
        }
    }
}

impl std::fmt::Display for PkceChallengeMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// PKCE Challenge
// =============================================================================

/// PKCE code challenge: `BASE64URL(SHA256(ASCII(code_verifier)))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge(String);

impl PkceChallenge {
    /// Creates a challenge from a raw string received from a client.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if the string is not valid unpadded
    /// URL-safe base64.
    pub fn new(challenge: String) -> AuthResult<Self> {
        if challenge.is_empty() || URL_SAFE_NO_PAD.decode(&challenge).is_err() {
            return Err(AuthError::invalid_input(
                "code_challenge must be URL-safe base64 without padding",
            ));
        }
        Ok(Self(challenge))
    }

    /// Computes the S256 challenge for a verifier.
    #[must_use]
    pub fn from_verifier(verifier: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(verifier.as_bytes());
        Self(URL_SAFE_NO_PAD.encode(hasher.finalize()))
    }

    /// Returns `true` iff the verifier hashes to this challenge.
    ///
    /// The comparison is constant-time over equal-length inputs; a length
    /// mismatch rejects immediately.
    #[must_use]
    pub fn matches(&self, verifier: &str) -> bool {
        let expected = Self::from_verifier(verifier);
        constant_time_eq(self.0.as_bytes(), expected.0.as_bytes())
    }

    /// Returns the challenge as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the challenge and returns the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for PkceChallenge {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Byte comparison that does not short-circuit on the first difference.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Verifies a PKCE proof: method must be S256 and the verifier must hash
/// to the challenge.
#[must_use]
pub fn verify(challenge: &PkceChallenge, verifier: &str, method: PkceChallengeMethod) -> bool {
    match method {
        PkceChallengeMethod::S256 => challenge.matches(verifier),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Test vector from RFC 7636 Appendix B.
    const RFC_VERIFIER: &str = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    const RFC_CHALLENGE: &str = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";

    #[test]
    fn test_rfc7636_appendix_b_test_vector() {
        let challenge = PkceChallenge::from_verifier(RFC_VERIFIER);
        assert_eq!(challenge.as_str(), RFC_CHALLENGE);

        let stored = PkceChallenge::new(RFC_CHALLENGE.to_string()).unwrap();
        assert!(stored.matches(RFC_VERIFIER));
    }

    #[test]
    fn test_wrong_verifier_rejected() {
        let stored = PkceChallenge::new(RFC_CHALLENGE.to_string()).unwrap();
        assert!(!stored.matches("wrong"));
        assert!(!stored.matches(""));
        assert!(!stored.matches("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXl"));
    }

    #[test]
    fn test_challenge_must_be_base64url() {
        assert!(PkceChallenge::new(RFC_CHALLENGE.to_string()).is_ok());

        let result = PkceChallenge::new("not valid base64url!!!".to_string());
        assert!(matches!(result, Err(AuthError::InvalidInput { .. })));

        let result = PkceChallenge::new(String::new());
        assert!(matches!(result, Err(AuthError::InvalidInput { .. })));
    }

    #[test]
    fn test_method_s256_accepted() {
        assert_eq!(
            PkceChallengeMethod::parse("S256").unwrap(),
            PkceChallengeMethod::S256
        );
        assert_eq!(PkceChallengeMethod::S256.as_str(), "S256");
    }

    #[test]
    fn test_method_plain_rejected() {
        let result = PkceChallengeMethod::parse("plain");
        assert!(matches!(result, Err(AuthError::InvalidInput { .. })));
    }

    #[test]
    fn test_method_unknown_rejected() {
        assert!(PkceChallengeMethod::parse("s256").is_err());
        assert!(PkceChallengeMethod::parse("SHA256").is_err());
        assert!(PkceChallengeMethod::parse("").is_err());
    }

    #[test]
    fn test_verify_helper() {
        let challenge = PkceChallenge::from_verifier(RFC_VERIFIER);
        assert!(verify(&challenge, RFC_VERIFIER, PkceChallengeMethod::S256));
        assert!(!verify(&challenge, "other", PkceChallengeMethod::S256));
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(constant_time_eq(b"", b""));
    }
}
