//! Mock driver
//!
//! Scripted module/device for tests. Every clone shares the same state, so a
//! test keeps one handle to inspect the call log after handing another to the
//! code under test. Supports failure injection on load, open and activate.

use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{
    ControlSignal, DriverError, ModuleLoadError, ModuleLoader, RawSensorEvent, SensorDevice,
    SensorHandle, SensorInfo, SensorModule, SENSORS_HARDWARE_MODULE_ID,
};

/// One recorded driver call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    Open,
    Activate {
        handle: SensorHandle,
        enabled: bool,
    },
    SetDelay {
        handle: SensorHandle,
        delay_ns: i64,
    },
    Poll,
    Close,
}

/// One scripted poll result
#[derive(Debug, Clone)]
pub enum MockPoll {
    /// Deliver these events (split across polls if larger than the buffer)
    Events(Vec<RawSensorEvent>),
    /// Nothing arrived
    Empty,
    /// Negative poll status
    Fail(i32),
    /// Raise the signal, then report nothing arrived
    Signal(ControlSignal),
}

#[derive(Debug, Default)]
struct MockState {
    sensors: Vec<SensorInfo>,
    script: VecDeque<MockPoll>,
    on_exhausted: Option<ControlSignal>,
    calls: Vec<DriverCall>,
    fail_load: u32,
    fail_open: u32,
    reject_activate: HashSet<SensorHandle>,
    opens: u32,
    closes: u32,
}

/// Scripted driver acting as loader, module and device factory
#[derive(Debug, Clone)]
pub struct MockDriver {
    module_id: String,
    state: Arc<Mutex<MockState>>,
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDriver {
    pub fn new() -> Self {
        Self {
            module_id: SENSORS_HARDWARE_MODULE_ID.to_string(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Module id reported to the loader
    pub fn with_module_id(mut self, id: &str) -> Self {
        self.module_id = id.to_string();
        self
    }

    /// Sensors returned by enumeration
    pub fn with_sensors(self, sensors: Vec<SensorInfo>) -> Self {
        self.lock().sensors = sensors;
        self
    }

    /// Fail the next `count` module loads
    pub fn fail_load(self, count: u32) -> Self {
        self.lock().fail_load = count;
        self
    }

    /// Fail the next `count` device opens
    pub fn fail_open(self, count: u32) -> Self {
        self.lock().fail_open = count;
        self
    }

    /// Reject `activate(handle, true)` for this handle
    pub fn reject_activate(self, handle: SensorHandle) -> Self {
        self.lock().reject_activate.insert(handle);
        self
    }

    /// Raise `signal` once the script runs dry
    pub fn on_exhausted(self, signal: ControlSignal) -> Self {
        self.lock().on_exhausted = Some(signal);
        self
    }

    /// Append poll results
    pub fn script(&self, polls: impl IntoIterator<Item = MockPoll>) {
        self.lock().script.extend(polls);
    }

    /// Recorded calls, oldest first
    pub fn calls(&self) -> Vec<DriverCall> {
        self.lock().calls.clone()
    }

    /// Recorded calls other than `Poll`
    pub fn control_calls(&self) -> Vec<DriverCall> {
        self.lock()
            .calls
            .iter()
            .filter(|c| **c != DriverCall::Poll)
            .cloned()
            .collect()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    pub fn open_count(&self) -> u32 {
        self.lock().opens
    }

    pub fn close_count(&self) -> u32 {
        self.lock().closes
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ModuleLoader for MockDriver {
    fn load_module(
        &self,
        _class_id: &str,
        instance: Option<&str>,
    ) -> Result<Box<dyn SensorModule>, ModuleLoadError> {
        let mut state = self.lock();
        if state.fail_load > 0 {
            state.fail_load -= 1;
            return Err(ModuleLoadError::not_found(
                instance.unwrap_or("mock"),
                "injected load failure",
            ));
        }
        Ok(Box::new(self.clone()))
    }
}

impl SensorModule for MockDriver {
    fn id(&self) -> &str {
        &self.module_id
    }

    fn name(&self) -> &str {
        "Mock sensor module"
    }

    fn open(&self) -> Result<Box<dyn SensorDevice>, DriverError> {
        let mut state = self.lock();
        state.calls.push(DriverCall::Open);
        if state.fail_open > 0 {
            state.fail_open -= 1;
            return Err(DriverError::open("injected open failure"));
        }
        state.opens += 1;
        Ok(Box::new(MockDevice {
            state: Arc::clone(&self.state),
        }))
    }
}

struct MockDevice {
    state: Arc<Mutex<MockState>>,
}

impl MockDevice {
    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SensorDevice for MockDevice {
    fn sensor_list(&self) -> Vec<SensorInfo> {
        self.lock().sensors.clone()
    }

    fn activate(&mut self, handle: SensorHandle, enabled: bool) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.calls.push(DriverCall::Activate { handle, enabled });
        if enabled && state.reject_activate.contains(&handle) {
            return Err(DriverError::Activate {
                handle,
                enabled,
                code: -22,
            });
        }
        Ok(())
    }

    fn set_delay(&mut self, handle: SensorHandle, delay_ns: i64) -> Result<(), DriverError> {
        self.lock()
            .calls
            .push(DriverCall::SetDelay { handle, delay_ns });
        Ok(())
    }

    fn poll(&mut self, buffer: &mut [RawSensorEvent]) -> Result<usize, DriverError> {
        let mut state = self.lock();
        state.calls.push(DriverCall::Poll);

        match state.script.pop_front() {
            Some(MockPoll::Events(mut events)) => {
                let n = events.len().min(buffer.len());
                let rest = events.split_off(n);
                buffer[..n].copy_from_slice(&events);
                if !rest.is_empty() {
                    state.script.push_front(MockPoll::Events(rest));
                }
                Ok(n)
            }
            Some(MockPoll::Empty) => Ok(0),
            Some(MockPoll::Fail(code)) => Err(DriverError::Poll { code }),
            Some(MockPoll::Signal(signal)) => {
                signal.request();
                Ok(0)
            }
            None => {
                if let Some(signal) = &state.on_exhausted {
                    signal.request();
                }
                Ok(0)
            }
        }
    }

    fn close(&mut self) -> Result<(), DriverError> {
        let mut state = self.lock();
        state.calls.push(DriverCall::Close);
        state.closes += 1;
        Ok(())
    }
}
