//! # Ingestion
//!
//! Sensor acquisition core.
//!
//! Responsibilities:
//! - Run the activation protocol over the sensor registry
//! - Poll the open device, translate raw events into canonical batches and
//!   publish them
//! - Switch between normal and low-power sensor sets from device state
//! - Serve shutdown and reinit requests, rebuilding the driver session
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{LoopControl, SensorDaemon};
//!
//! let control = LoopControl::new();
//! let mut daemon = SensorDaemon::new(&blueprint, loader, publisher, subscriber)?;
//! let exit = daemon.run(&control)?;
//! println!("{}", daemon.summary());
//! ```

mod acquisition;
mod activation;
mod batch;
mod control;
mod error;
mod metrics;
mod power;
mod supervisor;
mod translator;

pub mod mock;

// Re-exports
pub use acquisition::{AcquisitionLoop, SessionExit};
pub use activation::{activate_registry, apply_power_mode, ActivationReport};
pub use batch::{translate_batch, TranslatedBatch};
pub use control::LoopControl;
pub use error::{IngestionError, Result};
pub use metrics::{AcquisitionMetrics, AcquisitionStats, MetricsSnapshot};
pub use mock::{MockStateSubscriber, RecordingPublisher};
pub use power::PowerController;
pub use supervisor::{DaemonExit, SensorDaemon};
pub use translator::{translate, translate_event};
