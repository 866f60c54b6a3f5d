//! Password hashing and verification.
//!
//! Uses bcrypt with a per-call random salt. Comparison time depends only
//! on the cost parameter embedded in the stored hash, not on where the
//! candidate diverges.

use crate::AuthResult;
use crate::error::AuthError;

/// Default bcrypt cost parameter.
pub const DEFAULT_HASH_COST: u32 = 10;

/// Lowest cost bcrypt accepts.
const MIN_HASH_COST: u32 = 4;

/// Highest cost bcrypt accepts.
const MAX_HASH_COST: u32 = 31;

/// bcrypt password hasher with a configurable cost parameter.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Creates a hasher with the given cost.
    ///
    /// Costs outside bcrypt's valid range fall back to the default.
    #[must_use]
    pub fn new(cost: u32) -> Self {
        let cost = if (MIN_HASH_COST..=MAX_HASH_COST).contains(&cost) {
            cost
        } else {
            DEFAULT_HASH_COST
        };
        Self { cost }
    }

    /// Returns the effective cost parameter.
    #[must_use]
    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hashes a password for storage.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for an empty password, `Internal` if bcrypt
    /// fails (passwords over 72 bytes, allocation failure).
    pub fn hash(&self, password: &str) -> AuthResult<String> {
        if password.is_empty() {
            return Err(AuthError::invalid_input("password cannot be empty"));
        }

        bcrypt::hash(password, self.cost)
            .map_err(|e| AuthError::internal(format!("bcrypt hash failed: {e}")))
    }

    /// Verifies a password against a stored hash.
    ///
    /// Returns `false` for a mismatch, an empty input, or a malformed
    /// stored hash. Malformed hashes are a mismatch, not an error, so a
    /// corrupted record can never be bypassed or turned into a 500.
    #[must_use]
    pub fn compare(&self, hashed: &str, password: &str) -> bool {
        if hashed.is_empty() || password.is_empty() {
            return false;
        }

        bcrypt::verify(password, hashed).unwrap_or(false)
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_COST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Cost 4 keeps the test suite fast; the verification path is identical.
    fn hasher() -> PasswordHasher {
        PasswordHasher::new(4)
    }

    #[test]
    fn test_hash_and_compare_roundtrip() {
        let h = hasher();
        let hash = h.hash("Passw0rd!").unwrap();

        assert!(hash.starts_with("$2"));
        assert!(h.compare(&hash, "Passw0rd!"));
        assert!(!h.compare(&hash, "passw0rd!"));
        assert!(!h.compare(&hash, "Passw0rd"));
    }

    #[test]
    fn test_hash_empty_password_rejected() {
        let result = hasher().hash("");
        assert!(matches!(result, Err(AuthError::InvalidInput { .. })));
    }

    #[test]
    fn test_hash_uses_random_salt() {
        let h = hasher();
        let a = h.hash("same-password").unwrap();
        let b = h.hash("same-password").unwrap();

        assert_ne!(a, b);
        assert!(h.compare(&a, "same-password"));
        assert!(h.compare(&b, "same-password"));
    }

    #[test]
    fn test_compare_malformed_hash_is_mismatch() {
        let h = hasher();
        assert!(!h.compare("not-a-bcrypt-hash", "anything"));
        assert!(!h.compare("", "anything"));
    }

    #[test]
    fn test_compare_empty_password_is_mismatch() {
        let h = hasher();
        let hash = h.hash("secret-value").unwrap();
        assert!(!h.compare(&hash, ""));
    }

    #[test]
    fn test_cost_out_of_range_falls_back_to_default() {
        assert_eq!(PasswordHasher::new(0).cost(), DEFAULT_HASH_COST);
        assert_eq!(PasswordHasher::new(3).cost(), DEFAULT_HASH_COST);
        assert_eq!(PasswordHasher::new(99).cost(), DEFAULT_HASH_COST);
        assert_eq!(PasswordHasher::new(12).cost(), 12);
    }
}
