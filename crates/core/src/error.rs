use thiserror::Error;

/// Error taxonomy per spec §7. `NetworkError`/`TimeoutError` are recovered
/// locally by [`crate::retry::RetryPolicy`]; the rest propagate to the
/// caller with a stable variant the caller can match on.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("chain error: {0}")]
    Chain(String),

    #[error("concurrency error: {0}")]
    Concurrency(String),

    #[error("timeout error: {0}")]
    Timeout(String),
}

impl CoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, CoreError::Network(_) | CoreError::Timeout(_))
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
