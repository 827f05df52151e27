use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RandomError {
    #[error("random source unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("random source failed: {0}")]
    Random(#[from] RandomError),

    #[error("could not issue a unique token after {attempts} attempts, try again")]
    Exhausted { attempts: u32 },

    #[error("token is invalid, already used, or revoked")]
    InvalidToken,

    #[error("token has expired")]
    Expired,
}

impl TokenError {
    /// Issuance failures are transient; presentation failures are final for
    /// that attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Random(_) | Self::Exhausted { .. })
    }
}
