//! Power controller
//!
//! Level-triggered: on every due tick the desired mode is recomputed from the
//! latest device state, and activation calls are issued only when it differs
//! from the mode currently applied. A controller lives for one driver session
//! and always starts in `Normal`.

use contracts::{
    DeviceState, PowerConfig, PowerMode, SensorDevice, SensorRegistry, StateSubscriber,
};
use tracing::info;

use crate::activation::apply_power_mode;

#[derive(Debug)]
pub struct PowerController {
    enabled: bool,
    check_every: u64,
    topic: String,
    mode: PowerMode,
    /// Last state seen; kept when no fresh value is available
    last_state: DeviceState,
}

impl PowerController {
    pub fn new(config: &PowerConfig) -> Self {
        Self {
            enabled: config.enabled,
            check_every: config.check_every.max(1),
            topic: config.state_topic.clone(),
            mode: PowerMode::Normal,
            last_state: DeviceState::default(),
        }
    }

    /// Currently applied mode
    pub fn mode(&self) -> PowerMode {
        self.mode
    }

    /// Whether iteration `frame` samples the device state
    pub fn is_due(&self, frame: u64) -> bool {
        self.enabled && frame % self.check_every == 0
    }

    /// Mode implied by the latest device state
    pub fn desired_mode<S>(&mut self, subscriber: &mut S) -> PowerMode
    where
        S: StateSubscriber + ?Sized,
    {
        if let Some(state) = subscriber.read_latest(&self.topic) {
            self.last_state = state;
        }
        PowerMode::for_device_started(self.last_state.started)
    }

    /// Sample the device state on due frames and switch modes if needed.
    ///
    /// Returns the new mode when a transition was applied.
    pub fn tick<S>(
        &mut self,
        frame: u64,
        subscriber: &mut S,
        device: &mut dyn SensorDevice,
        registry: &SensorRegistry,
    ) -> Option<PowerMode>
    where
        S: StateSubscriber + ?Sized,
    {
        if !self.is_due(frame) {
            return None;
        }

        let desired = self.desired_mode(subscriber);
        if desired == self.mode {
            return None;
        }

        let report = apply_power_mode(device, registry, desired);
        info!(
            from = self.mode.as_str(),
            to = desired.as_str(),
            enabled = report.enabled,
            failures = report.failures,
            "power mode changed"
        );
        self.mode = desired;
        Some(desired)
    }
}
