//! Dispatch settings for the model manager.

use serde::Deserialize;
use std::time::Duration;

/// Settings that shape how the manager calls models.
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ManagerSettings {
    /// Deadline for a single model call, in milliseconds. Unset means no
    /// deadline.
    #[serde(default)]
    pub generation_timeout_ms: Option<u64>,
}

impl ManagerSettings {
    /// The per-call deadline, if any. A zero value is treated as unset.
    #[must_use]
    pub fn generation_timeout(&self) -> Option<Duration> {
        self.generation_timeout_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis)
    }
}
