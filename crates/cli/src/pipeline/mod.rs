//! Daemon orchestration module.

mod orchestrator;
mod signals;
mod stats;

pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use stats::RunStats;

use ingestion::DaemonExit;

/// How a `run` invocation ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunExit {
    Shutdown,

    /// Enumerate-only diagnostic run; carries the sensor count
    TestMode(usize),
}

impl From<DaemonExit> for RunExit {
    fn from(exit: DaemonExit) -> Self {
        match exit {
            DaemonExit::Shutdown => RunExit::Shutdown,
            DaemonExit::TestMode(count) => RunExit::TestMode(count),
        }
    }
}
