use std::time::Duration;

use thiserror::Error;

/// Failure of a single logical outbound call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallError {
    #[error("upstream did not answer within {}ms", after.as_millis())]
    Timeout { after: Duration },
    #[error("upstream answered with status {status}")]
    Upstream { status: u16, body: String },
    #[error("transport failure: {message}")]
    Transport { message: String },
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<CallError> },
}

impl CallError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    pub fn upstream(status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            status,
            body: body.into(),
        }
    }

    /// Server-side failures, rate limiting and timeouts are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            CallError::Timeout { .. } => true,
            CallError::Upstream { status, .. } => *status >= 500 || *status == 429,
            CallError::Transport { .. } | CallError::RetriesExhausted { .. } => false,
        }
    }

    /// The underlying cause, looking through `RetriesExhausted`.
    pub fn root(&self) -> &CallError {
        match self {
            CallError::RetriesExhausted { last, .. } => last.root(),
            other => other,
        }
    }

    /// Upstream status code of the underlying cause, if any.
    pub fn status(&self) -> Option<u16> {
        match self.root() {
            CallError::Upstream { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            CallError::Timeout { .. } => "timeout",
            CallError::Upstream { .. } => "upstream",
            CallError::Transport { .. } => "transport",
            CallError::RetriesExhausted { .. } => "retries_exhausted",
        }
    }
}
