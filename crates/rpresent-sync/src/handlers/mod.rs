//! Per-connection protocol handlers.
//!
//! Both roles start by reading one identity frame. Anything that goes
//! wrong after that (unknown id, bad payload, timeout, transport error)
//! ends the connection without telling the peer why, so probing clients
//! learn nothing about which identifiers exist.

mod presenter;
mod viewer;


use std::sync::Arc;
use std::time::Duration;

use rpresent_config::TimeoutsConfig;

use crate::index::IdIndex;
use crate::registry::ListenerRegistry;

pub use presenter::handle_presenter;
pub use viewer::handle_viewer;

/// Bounds for every wait a connection task performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Identity frame after connect.
    pub handshake: Duration,
    /// Gap between presenter slide messages.
    pub presenter_idle: Duration,
    /// Viewer mailbox wait before a liveness probe.
    pub viewer_wait: Duration,
    /// A single send, or a full ping/reply round-trip.
    pub send: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            handshake: Duration::from_secs(10),
            presenter_idle: Duration::from_secs(15 * 60),
            viewer_wait: Duration::from_secs(60),
            send: Duration::from_secs(10),
        }
    }
}

impl From<&TimeoutsConfig> for Timeouts {
    fn from(config: &TimeoutsConfig) -> Self {
        Self {
            handshake: config.handshake(),
            presenter_idle: config.presenter_idle(),
            viewer_wait: config.viewer_wait(),
            send: config.send(),
        }
    }
}

/// Shared state handed to every connection task.
#[derive(Debug, Clone)]
pub struct SyncContext {
    pub index: Arc<IdIndex>,
    pub registry: ListenerRegistry,
    pub timeouts: Timeouts,
}

impl SyncContext {
    pub fn new(index: Arc<IdIndex>, timeouts: Timeouts) -> Self {
        Self {
            index,
            registry: ListenerRegistry::new(),
            timeouts,
        }
    }
}
