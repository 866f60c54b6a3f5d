//! Signed-then-encrypted token service.
//!
//! Tokens are JWE compact serializations (`alg: dir`, `enc: A256GCM`)
//! whose plaintext is an HS256-signed JWT. The two layers use independent
//! 32-byte keys derived from one configured secret with distinct domain
//! separation, so possession of a token reveals nothing about its claims
//! and tampering at either layer fails validation deterministically.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit, Payload},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

use crate::AuthResult;
use crate::error::AuthError;
use crate::oauth::token::TokenPair;
use crate::token::claims::Claims;

/// Scope granted to access tokens.
pub const ACCESS_TOKEN_SCOPE: &str = "openid profile email";

/// Minimum length of the configured secret, in bytes.
const MIN_SECRET_LEN: usize = 32;

/// Domain separation suffix for the signing key.
const SIGNING_DOMAIN: &str = "_sig";

/// Domain separation suffix for the encryption key.
const ENCRYPTION_DOMAIN: &str = "_enc";

/// AES-GCM nonce size (96 bits).
const NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag size (128 bits).
const TAG_SIZE: usize = 16;

/// The JWE protected header for every token this service produces.
const JWE_PROTECTED_HEADER: &[u8] = br#"{"alg":"dir","enc":"A256GCM"}"#;

/// Derives a 32-byte key from the secret under a domain separation suffix.
fn derive_key(secret: &str, domain: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(domain.as_bytes());
    hasher.finalize().into()
}

/// Parsed JWE protected header, checked against the allow-list.
#[derive(Debug, Deserialize)]
struct JweHeader {
    alg: String,
    enc: String,
}

/// Encrypted token service.
///
/// Mint and validate are pure given the derived keys; the service holds
/// no per-token state and is safe under arbitrary parallelism.
pub struct TokenService {
    signing_key: [u8; 32],
    encryption_key: [u8; 32],
    issuer: String,
    audience: Vec<String>,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenService {
    /// Creates a token service from the configured secret.
    ///
    /// # Errors
    ///
    /// Returns `Misconfigured` if the secret is shorter than 32 bytes;
    /// the caller is expected to turn this into a startup failure.
    pub fn new(
        secret: &str,
        issuer: impl Into<String>,
        audience: Vec<String>,
        access_lifetime: Duration,
        refresh_lifetime: Duration,
    ) -> AuthResult<Self> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::misconfigured(format!(
                "token secret must be at least {MIN_SECRET_LEN} bytes, got {}",
                secret.len()
            )));
        }

        Ok(Self {
            signing_key: derive_key(secret, SIGNING_DOMAIN),
            encryption_key: derive_key(secret, ENCRYPTION_DOMAIN),
            issuer: issuer.into(),
            audience,
            access_lifetime,
            refresh_lifetime,
        })
    }

    /// Access token lifetime.
    #[must_use]
    pub fn access_lifetime(&self) -> Duration {
        self.access_lifetime
    }

    /// Mints an access/refresh token pair for an account.
    ///
    /// Access and refresh tokens differ only in lifetime and scope; the
    /// refresh token omits `scope`.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if signing or encryption fails.
    pub fn mint_pair(&self, subject: &str, email: &str, name: Option<&str>) -> AuthResult<TokenPair> {
        let now = OffsetDateTime::now_utc();

        let access = self.mint(&self.claims(subject, email, name, now, self.access_lifetime, true))?;
        let refresh =
            self.mint(&self.claims(subject, email, name, now, self.refresh_lifetime, false))?;

        Ok(TokenPair::new(
            access,
            refresh,
            u64::try_from(self.access_lifetime.whole_seconds()).unwrap_or(0),
            ACCESS_TOKEN_SCOPE.to_string(),
        ))
    }

    /// Signs and encrypts an arbitrary claim set.
    ///
    /// # Errors
    ///
    /// Returns `Internal` if signing or encryption fails.
    pub fn mint(&self, claims: &Claims) -> AuthResult<String> {
        let jws = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(&self.signing_key),
        )
        .map_err(|e| AuthError::internal(format!("failed to sign token: {e}")))?;

        self.encrypt(&jws)
    }

    /// Validates a token against the current clock.
    ///
    /// # Errors
    ///
    /// `InvalidToken` for any parse, algorithm, decryption, or signature
    /// failure; `Expired` / `NotYetValid` for time-bound failures.
    pub fn validate(&self, token: &str) -> AuthResult<Claims> {
        self.validate_at(token, OffsetDateTime::now_utc())
    }

    /// Validates a token at an explicit instant.
    ///
    /// Audience, issuer, and subject are decoded but not enforced here;
    /// checking them against expected values is the caller's contract.
    ///
    /// # Errors
    ///
    /// See [`TokenService::validate`].
    pub fn validate_at(&self, token: &str, now: OffsetDateTime) -> AuthResult<Claims> {
        let jws = self.decrypt(token)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<Claims>(
            &jws,
            &DecodingKey::from_secret(&self.signing_key),
            &validation,
        )
        .map_err(|e| AuthError::invalid_token(format!("inner JWT rejected: {e}")))?;

        let claims = data.claims;
        let now = now.unix_timestamp();
        if now > claims.exp {
            return Err(AuthError::Expired);
        }
        if now < claims.nbf {
            return Err(AuthError::NotYetValid);
        }

        Ok(claims)
    }

    /// Validates a refresh token and mints a fresh pair from its claims.
    ///
    /// # Errors
    ///
    /// Propagates the validation failure of the supplied token.
    pub fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPair> {
        let claims = self.validate(refresh_token)?;
        self.mint_pair(
            &claims.sub,
            claims.email.as_deref().unwrap_or_default(),
            claims.name.as_deref(),
        )
    }

    /// Revokes a token.
    ///
    /// Intentional stub: tokens are self-contained and no denylist is
    /// kept, so revocation does not affect subsequent validation.
    pub fn revoke(&self, _token: &str) -> AuthResult<()> {
        Ok(())
    }

    fn claims(
        &self,
        subject: &str,
        email: &str,
        name: Option<&str>,
        now: OffsetDateTime,
        lifetime: Duration,
        with_scope: bool,
    ) -> Claims {
        Claims {
            sub: subject.to_string(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: (now + lifetime).unix_timestamp(),
            iat: now.unix_timestamp(),
            nbf: now.unix_timestamp(),
            email: (!email.is_empty()).then(|| email.to_string()),
            name: name.map(str::to_string),
            scope: with_scope.then(|| ACCESS_TOKEN_SCOPE.to_string()),
        }
    }

    /// Wraps a compact JWS in a JWE (`header..iv.ciphertext.tag`).
    fn encrypt(&self, jws: &str) -> AuthResult<String> {
        let cipher = Aes256Gcm::new_from_slice(&self.encryption_key)
            .map_err(|e| AuthError::internal(format!("failed to create cipher: {e}")))?;

        let header = URL_SAFE_NO_PAD.encode(JWE_PROTECTED_HEADER);

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::Rng::fill(&mut rand::thread_rng(), &mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let sealed = cipher
            .encrypt(
                nonce,
                Payload {
                    msg: jws.as_bytes(),
                    aad: header.as_bytes(),
                },
            )
            .map_err(|e| AuthError::internal(format!("encryption failed: {e}")))?;

        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_SIZE);

        Ok(format!(
            "{header}..{}.{}.{}",
            URL_SAFE_NO_PAD.encode(nonce_bytes),
            URL_SAFE_NO_PAD.encode(ciphertext),
            URL_SAFE_NO_PAD.encode(tag),
        ))
    }

    /// Unwraps a compact JWE back to the inner JWS.
    fn decrypt(&self, token: &str) -> AuthResult<String> {
        let parts: Vec<&str> = token.split('.').collect();
        if parts.len() != 5 {
            return Err(AuthError::invalid_token("not a compact JWE"));
        }

        let header_json = URL_SAFE_NO_PAD
            .decode(parts[0])
            .map_err(|_| AuthError::invalid_token("malformed protected header"))?;
        let header: JweHeader = serde_json::from_slice(&header_json)
            .map_err(|_| AuthError::invalid_token("malformed protected header"))?;

        if header.alg != "dir" || header.enc != "A256GCM" {
            return Err(AuthError::invalid_token(format!(
                "disallowed algorithm: alg={} enc={}",
                header.alg, header.enc
            )));
        }

        // Direct key agreement carries no encrypted key.
        if !parts[1].is_empty() {
            return Err(AuthError::invalid_token("unexpected encrypted key segment"));
        }

        let nonce_bytes = URL_SAFE_NO_PAD
            .decode(parts[2])
            .map_err(|_| AuthError::invalid_token("malformed initialization vector"))?;
        if nonce_bytes.len() != NONCE_SIZE {
            return Err(AuthError::invalid_token("malformed initialization vector"));
        }

        let ciphertext = URL_SAFE_NO_PAD
            .decode(parts[3])
            .map_err(|_| AuthError::invalid_token("malformed ciphertext"))?;
        let tag = URL_SAFE_NO_PAD
            .decode(parts[4])
            .map_err(|_| AuthError::invalid_token("malformed authentication tag"))?;
        if tag.len() != TAG_SIZE {
            return Err(AuthError::invalid_token("malformed authentication tag"));
        }

        let cipher = Aes256Gcm::new_from_slice(&self.encryption_key)
            .map_err(|e| AuthError::internal(format!("failed to create cipher: {e}")))?;

        let mut sealed = ciphertext;
        sealed.extend_from_slice(&tag);

        let plaintext = cipher
            .decrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: &sealed,
                    aad: parts[0].as_bytes(),
                },
            )
            .map_err(|_| AuthError::invalid_token("decryption failed"))?;

        String::from_utf8(plaintext).map_err(|_| AuthError::invalid_token("invalid UTF-8 payload"))
    }
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("access_lifetime", &self.access_lifetime)
            .field("refresh_lifetime", &self.refresh_lifetime)
            .field("keys", &"<redacted>")
            .finish()
    }
}
