/// RS256 token issuance and verification
///
/// Tokens carry a fixed claim set:
///
/// - `sub`: the user the token was issued for
/// - `authorities`: caller-supplied role strings (e.g. `ROLE_ADMIN`)
/// - `scope`: always `["read"]`
/// - `jti`: random UUID, unique per token
/// - `iat` / `nbf` / `exp`: issue time, not-before (= issue time), expiry
/// - `iss`: always `"jwt"`
///
/// The header always names key id `"test"`. Validity is purely cryptographic and
/// time-bound; there is no revocation list.
use crate::keys::{KeyError, KeyPair};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Constants
// ============================================================================

/// The only algorithm tokens are signed or accepted with
pub const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

pub const KEY_ID: &str = "test";
pub const ISSUER: &str = "jwt";
pub const READ_SCOPE: &str = "read";
pub const BEARER_PREFIX: &str = "Bearer ";

pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 60;

/// One year
pub const MAX_TOKEN_TTL_MINUTES: i64 = 365 * 24 * 60;

/// Clock skew tolerated on `exp` / `nbf`
pub const LEEWAY_SECONDS: u64 = 60;

// ============================================================================
// Data Structures
// ============================================================================

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub authorities: Vec<String>,
    pub scope: Vec<String>,
    pub jti: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
    pub iss: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("token rejected: {0}")]
    Rejected(String),

    #[error("failed to sign token: {0}")]
    Signing(String),

    #[error(transparent)]
    Key(#[from] KeyError),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_) => TokenError::Malformed(err.to_string()),
            _ => TokenError::Rejected(err.to_string()),
        }
    }
}

// ============================================================================
// Issuance
// ============================================================================

/// Signs tokens with the private half of a [`KeyPair`].
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(keys: &KeyPair, ttl: Duration) -> Result<Self, TokenError> {
        Ok(Self {
            encoding_key: keys.encoding_key()?,
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mint a fresh token for `subject` carrying `authorities`.
    pub fn issue(&self, subject: &str, authorities: &[String]) -> Result<String, TokenError> {
        self.issue_at(subject, authorities, Utc::now())
    }

    /// Mint a token as if it were issued at `issued_at`.
    pub fn issue_at(
        &self,
        subject: &str,
        authorities: &[String],
        issued_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let iat = issued_at.timestamp();
        let expires_at = issued_at
            .checked_add_signed(self.ttl)
            .ok_or_else(|| TokenError::Signing("token expiry is out of range".to_string()))?;
        let claims = Claims {
            sub: subject.to_string(),
            authorities: authorities.to_vec(),
            scope: vec![READ_SCOPE.to_string()],
            jti: Uuid::new_v4().to_string(),
            iat,
            nbf: iat,
            exp: expires_at.timestamp(),
            iss: ISSUER.to_string(),
        };

        let mut header = Header::new(JWT_ALGORITHM);
        header.kid = Some(KEY_ID.to_string());

        encode(&header, &claims, &self.encoding_key).map_err(|e| TokenError::Signing(e.to_string()))
    }
}

// ============================================================================
// Verification
// ============================================================================

/// Verifies tokens against the public half of a [`KeyPair`].
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(keys: &KeyPair) -> Result<Self, TokenError> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = LEEWAY_SECONDS;
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);

        Ok(Self {
            decoding_key: keys.decoding_key()?,
            validation,
        })
    }

    /// Check signature, expiry, not-before and issuer; return the claims.
    ///
    /// `token` is the compact JWT without the `Bearer ` prefix.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }
}

// ============================================================================
// Tests
// ============================================================================
