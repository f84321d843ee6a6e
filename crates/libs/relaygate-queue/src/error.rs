use serde::{Deserialize, Serialize};

/// Communication or remote failure raised while forwarding a call.
///
/// Two-way callers receive this through their sink. It never escapes the
/// pump loop.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum RemoteFault {
    #[error("connection refused: {endpoint}")]
    ConnectionRefused { endpoint: String },

    #[error("connection lost: {reason}")]
    ConnectionLost { reason: String },

    #[error("timeout: {operation}")]
    Timeout { operation: String },

    #[error("object does not exist: {identity}")]
    ObjectNotExist { identity: String },

    #[error("no connection for {identity}")]
    NoConnection { identity: String },

    #[error("unknown fault: {message}")]
    Unknown { message: String },
}

impl RemoteFault {
    /// Returns `true` for transient faults that may succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionRefused { .. } | Self::ConnectionLost { .. } | Self::Timeout { .. }
        )
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown { message: message.into() }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("failed to spawn pump thread: {0}")]
    Spawn(#[from] std::io::Error),
}
