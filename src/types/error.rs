//! Error types for the authorization core
//!
//! Every variant is terminal for the current request. Nothing in the core retries.

use hyper::StatusCode;

use crate::db::StoreError;

/// Errors surfaced by login, token verification and access decisions
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown identity or wrong password. Same message for both.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Pending challenge token has passed its expiry
    #[error("Challenge expired, start login again")]
    ChallengeExpired,

    /// Submitted one-time code does not match the challenge
    #[error("Invalid MFA code")]
    InvalidCode,

    /// Challenge token is malformed, badly signed, or not a challenge token
    #[error("Invalid token")]
    InvalidToken,

    /// Session token has passed its expiry
    #[error("Token expired")]
    TokenExpired,

    /// No bearer token supplied
    #[error("Unauthorized")]
    Unauthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("An account with this identity already exists")]
    AlreadyRegistered,

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials
            | Self::ChallengeExpired
            | Self::InvalidCode
            | Self::InvalidToken
            | Self::TokenExpired
            | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::AlreadyRegistered => StatusCode::CONFLICT,
            Self::Store(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to hand back to a client.
    ///
    /// Storage, configuration and internal failures collapse to one opaque string.
    pub fn public_message(&self) -> String {
        match self {
            Self::Store(_) | Self::Config(_) | Self::Internal(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }

    /// The caller can fix this by re-entering input, without restarting login
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::InvalidCredentials | Self::InvalidCode)
    }

    /// The caller must start over from `begin_login`
    pub fn requires_restart(&self) -> bool {
        matches!(self, Self::ChallengeExpired | Self::TokenExpired)
    }

    /// Convert to status code and body tuple for HTTP response
    pub fn into_status_code_and_body(self) -> (StatusCode, String) {
        let status = self.status_code();
        let body = serde_json::json!({ "error": self.public_message() }).to_string();
        (status, body)
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        Self::BadRequest(format!("JSON error: {}", err))
    }
}

/// Result type alias for authorization core operations
pub type Result<T> = std::result::Result<T, AuthError>;
