use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    /// The distributed tier could not be reached. Triggers fallback; never
    /// surfaced to callers of the fetcher.
    #[error("cache unavailable: {reason}")]
    Unavailable { reason: String },
    #[error("cache value could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("cache backend error: {message}")]
    Backend { message: String },
}

impl CacheError {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() || err.is_io_error() || err.is_timeout() {
            return Self::unavailable(err.to_string());
        }
        Self::backend(err.to_string())
    }
}
