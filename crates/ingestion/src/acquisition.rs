//! Acquisition loop
//!
//! Runs inside one open driver session. Each iteration:
//! 1. observe shutdown, then consume a pending reinit request
//! 2. poll the device into a fixed-capacity buffer
//! 3. translate and publish the batch (empty batches included)
//! 4. let the power controller sample device state on due frames
//!
//! Zero-count polls skip steps 3 and 4 and do not advance the frame counter.
//! Negative polls are counted; past the configured threshold the loop backs
//! off exponentially until a poll succeeds again.

use std::thread;

use contracts::{
    BackoffConfig, DriverError, EventPublisher, PowerConfig, RawSensorEvent, SensorDevice,
    SensorRegistry, SensordBlueprint, StateSubscriber, Topic,
};
use tracing::{debug, instrument, trace, warn};

use crate::batch::translate_batch;
use crate::control::LoopControl;
use crate::metrics::AcquisitionStats;
use crate::power::PowerController;

/// Why a session's loop returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionExit {
    Shutdown,
    Reinit,
}

/// Poll/translate/publish loop, reused across driver sessions
pub struct AcquisitionLoop<P, S> {
    registry: SensorRegistry,
    channel: Topic,
    publisher: P,
    subscriber: S,
    power: PowerConfig,
    batch_capacity: usize,
    failure_threshold: u32,
    backoff: BackoffConfig,

    /// Sequence number of the next published batch; never reset
    next_seq: u64,
    stats: AcquisitionStats,
}

impl<P, S> AcquisitionLoop<P, S>
where
    P: EventPublisher,
    S: StateSubscriber,
{
    /// Build the loop and subscribe to the device-state topic
    pub fn new(
        blueprint: &SensordBlueprint,
        registry: SensorRegistry,
        publisher: P,
        mut subscriber: S,
    ) -> Self {
        subscriber.subscribe(&blueprint.power.state_topic);

        Self {
            registry,
            channel: Topic::new(&blueprint.publish.channel),
            publisher,
            subscriber,
            power: blueprint.power.clone(),
            batch_capacity: blueprint.acquisition.batch_capacity.max(1),
            failure_threshold: blueprint.acquisition.failure_threshold,
            backoff: blueprint.acquisition.backoff(),
            next_seq: 0,
            stats: AcquisitionStats::new(),
        }
    }

    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    pub fn channel(&self) -> &Topic {
        &self.channel
    }

    pub fn publisher(&self) -> &P {
        &self.publisher
    }

    pub fn subscriber(&self) -> &S {
        &self.subscriber
    }

    pub fn stats(&self) -> &AcquisitionStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut AcquisitionStats {
        &mut self.stats
    }

    /// Acquire from `device` until shutdown or reinit is requested.
    ///
    /// The device is expected to be freshly activated. Power mode and frame
    /// counter start over on every call.
    #[instrument(name = "acquisition_session", skip_all, fields(channel = %self.channel))]
    pub fn run_session(
        &mut self,
        device: &mut dyn SensorDevice,
        control: &LoopControl,
    ) -> SessionExit {
        let mut power = PowerController::new(&self.power);
        let mut buffer = vec![RawSensorEvent::default(); self.batch_capacity];
        let mut frame: u64 = 0;
        let mut consecutive_failures: u32 = 0;

        loop {
            if control.shutdown.is_requested() {
                debug!(frames = frame, "shutdown requested");
                return SessionExit::Shutdown;
            }
            if control.reinit.take() {
                debug!(frames = frame, "reinit requested");
                return SessionExit::Reinit;
            }

            let count = match device.poll(&mut buffer) {
                Ok(0) => {
                    consecutive_failures = 0;
                    continue;
                }
                Ok(n) => {
                    consecutive_failures = 0;
                    n.min(buffer.len())
                }
                Err(e) => {
                    consecutive_failures = consecutive_failures.saturating_add(1);
                    self.stats.on_poll_error(&e);
                    self.back_off(consecutive_failures, &e);
                    continue;
                }
            };

            let translated = translate_batch(self.next_seq, &buffer[..count]);
            self.next_seq += 1;
            if translated.unrecognized > 0 {
                trace!(
                    seq = translated.batch.seq,
                    dropped = translated.unrecognized,
                    "unrecognized events dropped"
                );
            }

            self.stats.on_batch(&translated.batch, translated.unrecognized);
            self.publisher.publish(&self.channel, translated.batch);

            if let Some(mode) = power.tick(frame, &mut self.subscriber, device, &self.registry) {
                self.stats.on_power_transition(mode);
            }
            frame += 1;
        }
    }

    fn back_off(&self, failures: u32, error: &DriverError) {
        if failures <= self.failure_threshold {
            warn!(failures, error = %error, "poll failed");
            return;
        }

        let delay = self.backoff.delay_for(failures - self.failure_threshold - 1);
        if failures == self.failure_threshold + 1 {
            warn!(
                failures,
                error = %error,
                delay_ms = delay.as_millis() as u64,
                "poll keeps failing, backing off"
            );
        } else {
            debug!(failures, delay_ms = delay.as_millis() as u64, "poll backoff");
        }
        thread::sleep(delay);
    }
}
