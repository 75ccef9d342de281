//! # Dispatcher
//!
//! Publish and state-subscription side of the daemon.
//!
//! Responsibilities:
//! - Accept batches from the acquisition thread without blocking it
//! - Fan out to multiple sinks, each behind an isolated bounded queue
//! - Keep the latest device state for the power controller

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod publisher;
pub mod sinks;
pub mod state;

pub use contracts::{DataSink, PublishedBatch};
pub use dispatcher::{create_dispatcher, Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, PublisherMetrics, SinkMetrics};
pub use publisher::ChannelPublisher;
pub use sinks::{FileSink, LogSink, NetworkSink};
pub use state::{
    device_state_channel, DeviceStateCache, DeviceStateFeed, StateListener, StateMessage,
};
