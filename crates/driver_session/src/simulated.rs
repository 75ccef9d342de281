//! Simulated sensor hardware
//!
//! Emulates the stock sensor hub: same handles and type tags, per-sensor
//! pacing from the requested delay and small uniform noise on every reading.
//! Used for development without target hardware.

use std::thread;
use std::time::{Duration, Instant};

use contracts::{
    type_tag, DriverError, RawSensorEvent, SensorDevice, SensorHandle, SensorInfo, SensorModule,
    SENSORS_HARDWARE_MODULE_ID,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, trace};

/// errno-style status for an unknown handle
const EINVAL: i32 = -22;

/// (handle, name, type tag, min delay µs, max delay µs)
const HARDWARE: [(SensorHandle, &str, i32, i32, i64); 8] = [
    (0, "proximity", type_tag::PROXIMITY, 0, 0),
    (3, "magnetometer_uncalibrated", type_tag::MAGNETIC_FIELD_UNCALIBRATED, 10_000, 1_000_000),
    (8, "gyroscope_uncalibrated", type_tag::GYROSCOPE_UNCALIBRATED, 2_500, 1_000_000),
    (9, "gyroscope", type_tag::GYROSCOPE, 2_500, 1_000_000),
    (13, "magnetometer", type_tag::MAGNETIC_FIELD, 10_000, 1_000_000),
    (14, "light", type_tag::LIGHT, 0, 0),
    (15, "accelerometer", type_tag::ACCELEROMETER, 2_500, 1_000_000),
    (16, "accelerometer_uncalibrated", type_tag::ACCELEROMETER_UNCALIBRATED, 2_500, 1_000_000),
];

/// Default pacing for sensors that were never given a delay
const DEFAULT_PERIOD: Duration = Duration::from_millis(200);

/// Simulated hardware module
pub struct SimulatedModule {
    poll_timeout: Duration,
}

impl SimulatedModule {
    pub fn new(poll_timeout: Duration) -> Self {
        Self { poll_timeout }
    }

    /// Sensors exposed by the simulated hub
    pub fn sensor_list() -> Vec<SensorInfo> {
        HARDWARE
            .iter()
            .map(|&(handle, name, type_tag, min_delay_us, max_delay_us)| SensorInfo {
                handle,
                name: name.to_string(),
                type_tag,
                min_delay_us,
                max_delay_us,
            })
            .collect()
    }
}

impl SensorModule for SimulatedModule {
    fn id(&self) -> &str {
        SENSORS_HARDWARE_MODULE_ID
    }

    fn name(&self) -> &str {
        "Simulated sensor hub"
    }

    fn open(&self) -> Result<Box<dyn SensorDevice>, DriverError> {
        debug!("simulated sensor hub opened");
        Ok(Box::new(SimulatedDevice::new(self.poll_timeout)))
    }
}

struct Channel {
    info: SensorInfo,
    enabled: bool,
    period: Duration,
    next_due: Instant,
    /// Announce sensor metadata before the first reading
    pending_info: bool,
}

/// Open simulated device
pub struct SimulatedDevice {
    channels: Vec<Channel>,
    epoch: Instant,
    poll_timeout: Duration,
    rng: StdRng,
}

impl SimulatedDevice {
    pub fn new(poll_timeout: Duration) -> Self {
        let epoch = Instant::now();
        let channels = SimulatedModule::sensor_list()
            .into_iter()
            .map(|info| Channel {
                info,
                enabled: false,
                period: DEFAULT_PERIOD,
                next_due: epoch,
                pending_info: false,
            })
            .collect();

        Self {
            channels,
            epoch,
            poll_timeout,
            rng: StdRng::from_os_rng(),
        }
    }

    fn channel_mut(&mut self, handle: SensorHandle) -> Option<&mut Channel> {
        self.channels.iter_mut().find(|c| c.info.handle == handle)
    }

    fn timestamp(&self, at: Instant) -> i64 {
        at.duration_since(self.epoch).as_nanos() as i64
    }

    /// Fill `buffer` with every due reading; returns how many were written
    fn drain_due(&mut self, now: Instant, buffer: &mut [RawSensorEvent]) -> usize {
        let timestamp = self.timestamp(now);
        let mut count = 0;

        for idx in 0..self.channels.len() {
            if count == buffer.len() {
                break;
            }
            let channel = &self.channels[idx];
            if !channel.enabled || channel.next_due > now {
                continue;
            }

            let handle = channel.info.handle;
            let tag = channel.info.type_tag;

            if channel.pending_info {
                buffer[count] = RawSensorEvent::new(type_tag::ADDITIONAL_INFO, handle, timestamp);
                count += 1;
                self.channels[idx].pending_info = false;
                if count == buffer.len() {
                    break;
                }
            }

            buffer[count] = self.reading(tag, handle, timestamp);
            count += 1;

            let channel = &mut self.channels[idx];
            channel.next_due += channel.period;
            if channel.next_due < now {
                channel.next_due = now + channel.period;
            }
        }

        count
    }

    fn reading(&mut self, tag: i32, handle: SensorHandle, timestamp: i64) -> RawSensorEvent {
        let event = RawSensorEvent::new(tag, handle, timestamp);
        let mut noise = |scale: f32| self.rng.random_range(-scale..scale);

        match tag {
            type_tag::ACCELEROMETER => {
                event.with_vector([noise(0.05), noise(0.05), 9.81 + noise(0.05)], 3)
            }
            type_tag::GYROSCOPE => event.with_vector([noise(0.002), noise(0.002), noise(0.002)], 3),
            type_tag::MAGNETIC_FIELD => {
                event.with_vector([22.0 + noise(0.5), -4.0 + noise(0.5), 41.0 + noise(0.5)], 3)
            }
            type_tag::MAGNETIC_FIELD_UNCALIBRATED => event.with_uncalibrated(
                [57.0 + noise(0.5), 12.0 + noise(0.5), 20.0 + noise(0.5)],
                [35.0, 16.0, -21.0],
            ),
            type_tag::GYROSCOPE_UNCALIBRATED => event.with_uncalibrated(
                [0.01 + noise(0.002), -0.02 + noise(0.002), 0.005 + noise(0.002)],
                [0.01, -0.02, 0.005],
            ),
            type_tag::ACCELEROMETER_UNCALIBRATED => event.with_uncalibrated(
                [0.1 + noise(0.05), 0.05 + noise(0.05), 9.9 + noise(0.05)],
                [0.1, 0.05, 0.09],
            ),
            type_tag::PROXIMITY => event.with_scalar(5.0),
            type_tag::LIGHT => event.with_scalar(320.0 + noise(10.0)),
            _ => event,
        }
    }
}

impl SensorDevice for SimulatedDevice {
    fn sensor_list(&self) -> Vec<SensorInfo> {
        self.channels.iter().map(|c| c.info.clone()).collect()
    }

    fn activate(&mut self, handle: SensorHandle, enabled: bool) -> Result<(), DriverError> {
        let channel = self.channel_mut(handle).ok_or(DriverError::Activate {
            handle,
            enabled,
            code: EINVAL,
        })?;

        if enabled && !channel.enabled {
            channel.next_due = Instant::now();
            channel.pending_info = true;
        }
        channel.enabled = enabled;
        trace!(handle, enabled, "simulated activate");
        Ok(())
    }

    fn set_delay(&mut self, handle: SensorHandle, delay_ns: i64) -> Result<(), DriverError> {
        let channel = self.channel_mut(handle).ok_or(DriverError::SetDelay {
            handle,
            code: EINVAL,
        })?;

        let min_ns = i64::from(channel.info.min_delay_us) * 1_000;
        let period_ns = delay_ns.max(min_ns).max(1);
        channel.period = Duration::from_nanos(period_ns as u64);
        trace!(handle, period_ns, "simulated set_delay");
        Ok(())
    }

    fn poll(&mut self, buffer: &mut [RawSensorEvent]) -> Result<usize, DriverError> {
        if buffer.is_empty() {
            return Ok(0);
        }

        let deadline = Instant::now() + self.poll_timeout;
        loop {
            let now = Instant::now();
            let count = self.drain_due(now, buffer);
            if count > 0 {
                return Ok(count);
            }
            if now >= deadline {
                return Ok(0);
            }

            let wake = self
                .channels
                .iter()
                .filter(|c| c.enabled)
                .map(|c| c.next_due)
                .min()
                .unwrap_or(deadline)
                .min(deadline);
            thread::sleep(wake.saturating_duration_since(now));
        }
    }

    fn close(&mut self) -> Result<(), DriverError> {
        for channel in &mut self.channels {
            channel.enabled = false;
        }
        debug!("simulated sensor hub closed");
        Ok(())
    }
}
