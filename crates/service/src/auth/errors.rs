use thiserror::Error;

/// Business errors for the admin session workflow
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    Unauthorized,
    #[error("session expired")]
    Expired,
    #[error("hashing error: {0}")]
    HashError(String),
    #[error("token error: {0}")]
    TokenError(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl AuthError {
    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Unauthorized => 1004,
            AuthError::Expired => 1005,
            AuthError::HashError(_) => 1101,
            AuthError::TokenError(_) => 1102,
            AuthError::Config(_) => 1300,
        }
    }
}
