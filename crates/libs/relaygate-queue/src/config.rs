use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueConfig {
    /// Pause after every drained batch, in milliseconds. Zero disables it.
    #[serde(default)]
    pub throttle_ms: u64,
}

impl QueueConfig {
    pub fn with_throttle(throttle: Duration) -> Self {
        Self { throttle_ms: u64::try_from(throttle.as_millis()).unwrap_or(u64::MAX) }
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }
}
