//! Loop control signals

use contracts::ControlSignal;

/// Shutdown and reinit requests observed by the acquisition loop.
///
/// Both flags may be raised from any thread or signal handler.
#[derive(Debug, Clone, Default)]
pub struct LoopControl {
    /// Stop acquiring and exit
    pub shutdown: ControlSignal,

    /// Tear down the current session and open a new one
    pub reinit: ControlSignal,
}

impl LoopControl {
    pub fn new() -> Self {
        Self::default()
    }
}
