//! # Driver Session
//!
//! Binds a sensor hardware module and owns the open device connection.
//!
//! Responsibilities:
//! - Resolve a module by class id / instance hint (`BuiltinModuleLoader`)
//! - Open the device and enumerate its sensors (`DriverSession`)
//! - Retry failed opens with exponential backoff (`open_with_retry`)
//! - Guarantee the device is closed exactly once
//! - Provide simulated, replay and mock modules

pub mod error;
pub mod loader;
pub mod mock;
pub mod replay;
pub mod retry;
pub mod session;
pub mod simulated;

pub use error::{Result, SessionError};
pub use loader::{BuiltinModuleLoader, ModuleFactory};
pub use mock::{DriverCall, MockDriver, MockPoll};
pub use replay::{ReplayHeader, ReplayModule};
pub use retry::open_with_retry;
pub use session::DriverSession;
pub use simulated::SimulatedModule;
