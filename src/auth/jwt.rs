//! Signed token codec for challenge and session tokens
//!
//! Both token kinds are HS256 JWTs signed with one server-side secret. The
//! `stage` claim tells them apart, so a pending challenge can never be
//! presented as a session and vice versa.
//!
//! Tokens are stateless. There is no revocation list: a leaked session token
//! stays valid until its `exp`.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::Role;
use crate::types::AuthError;

/// Claims of a challenge token issued after the password check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingClaims {
    pub id: u64,
    pub email: String,
    pub role: Role,
    /// Argon2 PHC hash of the one-time code
    pub mfa_code_hash: String,
    pub iat: u64,
    pub exp: u64,
}

/// Claims of a session token presented on every authorized request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub id: u64,
    pub email: String,
    pub role: Role,
    pub iat: u64,
    pub exp: u64,
}

/// Any token this codec issues, discriminated by its `stage` claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage")]
pub enum TokenClaims {
    #[serde(rename = "mfa_pending")]
    Pending(PendingClaims),
    #[serde(rename = "session")]
    Session(SessionClaims),
}

impl TokenClaims {
    pub fn exp(&self) -> u64 {
        match self {
            Self::Pending(c) => c.exp,
            Self::Session(c) => c.exp,
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            Self::Pending(_) => "mfa_pending",
            Self::Session(_) => "session",
        }
    }
}

/// Why a token failed to decode
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    /// Signature is fine but `now >= exp`
    #[error("Token expired")]
    Expired,

    /// Bad signature or malformed structure
    #[error("Invalid token: {0}")]
    Invalid(&'static str),

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Minimum secret length outside dev mode
pub const MIN_SECRET_LEN: usize = 32;

const DEV_SECRET: &str = "dev-mode-secret-not-for-production-use-123456";

/// JWT encoder/decoder bound to one shared secret
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Create a codec
    ///
    /// Returns an error if the secret is empty or too short
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::Config(
                "JWT_SECRET is required in production mode".into(),
            ));
        }

        if secret.len() < MIN_SECRET_LEN {
            return Err(AuthError::Config(format!(
                "JWT_SECRET must be at least {MIN_SECRET_LEN} characters"
            )));
        }

        Ok(Self::from_secret(secret.as_bytes()))
    }

    /// Create a codec for dev mode with a well-known secret
    pub fn new_dev() -> Self {
        Self::from_secret(DEV_SECRET.as_bytes())
    }

    fn from_secret(secret: &[u8]) -> Self {
        // Expiry is checked against the injected clock in `decode`, with no leeway.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn encode(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Verify signature and structure, then expiry against `now`
    pub fn decode(&self, token: &str, now: u64) -> Result<TokenClaims, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding, &self.validation).map_err(|err| {
            use jsonwebtoken::errors::ErrorKind;
            TokenError::Invalid(match err.kind() {
                ErrorKind::InvalidSignature => "Invalid signature",
                ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) => {
                    "Malformed token"
                }
                ErrorKind::MissingRequiredClaim(_) => "Missing required claim",
                ErrorKind::InvalidAlgorithm => "Invalid algorithm",
                _ => "Token validation failed",
            })
        })?;

        if now >= data.claims.exp() {
            return Err(TokenError::Expired);
        }

        Ok(data.claims)
    }
}

/// Extract a token from an Authorization header value.
///
/// Accepts `Bearer <token>` and a bare token without spaces.
pub fn extract_token_from_header(auth_header: Option<&str>) -> Option<&str> {
    let header = auth_header?;

    let token = match header.strip_prefix("Bearer ") {
        Some(rest) => rest.trim(),
        None if !header.contains(' ') => header.trim(),
        None => return None,
    };

    (!token.is_empty()).then_some(token)
}
