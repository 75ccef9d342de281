//! # Contracts
//!
//! Frozen interface contracts shared by every sensord crate: the raw hardware
//! event layout, the canonical published schema, the sensor registry, the
//! configuration blueprint and the collaborator traits (driver, publisher,
//! state subscription). Business crates depend only on this crate, never on
//! each other's internals.
//!
//! ## Time Model
//! - Raw and canonical timestamps are driver nanoseconds (`i64`), copied verbatim
//! - Batches carry a process-local sequence number for ordering/diagnostics

mod blueprint;
mod control;
mod driver;
mod error;
mod raw;
mod registry;
mod sensor;
mod sink;
mod state;
mod topic;

pub use blueprint::*;
pub use control::ControlSignal;
pub use driver::*;
pub use error::*;
pub use raw::*;
pub use registry::*;
pub use sensor::*;
pub use sink::*;
pub use state::*;
pub use topic::Topic;
