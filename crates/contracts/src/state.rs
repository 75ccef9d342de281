//! Device state subscription contract

use serde::{Deserialize, Serialize};

/// Latest known host device state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceState {
    /// Device is actively in use
    pub started: bool,
}

/// Non-blocking, best-effort view of externally published state.
pub trait StateSubscriber: Send {
    /// Start following `topic`
    fn subscribe(&mut self, topic: &str);

    /// Latest value seen on `topic`, `None` if nothing has arrived yet.
    ///
    /// Must never block.
    fn read_latest(&mut self, topic: &str) -> Option<DeviceState>;
}
