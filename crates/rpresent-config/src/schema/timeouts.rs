use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounds applied to every suspension point of a connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutsConfig {
    /// Time allowed for the identity message (valid range: 1-300).
    pub handshake_secs: u32,
    /// Presenter inactivity bound (valid range: 10-86400).
    pub presenter_idle_secs: u32,
    /// Viewer mailbox wait before a liveness probe (valid range: 1-3600).
    pub viewer_wait_secs: u32,
    /// Bound on a single send or ping round-trip (valid range: 1-300).
    pub send_secs: u32,
}

impl TimeoutsConfig {
    pub fn handshake(&self) -> Duration {
        Duration::from_secs(self.handshake_secs.into())
    }

    pub fn presenter_idle(&self) -> Duration {
        Duration::from_secs(self.presenter_idle_secs.into())
    }

    pub fn viewer_wait(&self) -> Duration {
        Duration::from_secs(self.viewer_wait_secs.into())
    }

    pub fn send(&self) -> Duration {
        Duration::from_secs(self.send_secs.into())
    }
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            handshake_secs: 10,
            presenter_idle_secs: 900,
            viewer_wait_secs: 60,
            send_secs: 10,
        }
    }
}
