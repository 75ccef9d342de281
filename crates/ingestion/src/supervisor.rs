//! Outer session loop
//!
//! Opens a driver session (with retry), activates the registry, runs the
//! acquisition loop and closes the session before either exiting or, on a
//! reinit request, starting over with a brand-new session.

use std::sync::Arc;

use contracts::{
    DriverConfig, EventPublisher, ModuleLoader, SensordBlueprint, SessionConfig, StateSubscriber,
};
use driver_session::{open_with_retry, SessionError};
use observability::MetricsSummary;
use tracing::{error, info, instrument, warn};

use crate::acquisition::{AcquisitionLoop, SessionExit};
use crate::activation::activate_registry;
use crate::control::LoopControl;
use crate::error::Result;
use crate::metrics::AcquisitionMetrics;

/// How the daemon stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonExit {
    /// Shutdown was requested
    Shutdown,

    /// Diagnostic mode: the first session enumerated this many sensors
    TestMode(usize),
}

/// Session supervisor
pub struct SensorDaemon<P, S> {
    loader: Box<dyn ModuleLoader>,
    driver: DriverConfig,
    session: SessionConfig,
    acquisition: AcquisitionLoop<P, S>,
    test_mode: bool,
}

impl<P, S> SensorDaemon<P, S>
where
    P: EventPublisher,
    S: StateSubscriber,
{
    /// Build the daemon; fails only on an invalid sensor registry
    pub fn new(
        blueprint: &SensordBlueprint,
        loader: Box<dyn ModuleLoader>,
        publisher: P,
        subscriber: S,
    ) -> Result<Self> {
        let registry = blueprint.to_registry()?;

        Ok(Self {
            loader,
            driver: blueprint.driver.clone(),
            session: blueprint.session.clone(),
            acquisition: AcquisitionLoop::new(blueprint, registry, publisher, subscriber),
            test_mode: false,
        })
    }

    /// Exit right after enumeration with the sensor count
    pub fn with_test_mode(mut self, enabled: bool) -> Self {
        self.test_mode = enabled;
        self
    }

    pub fn publisher(&self) -> &P {
        self.acquisition.publisher()
    }

    /// Run summary so far
    pub fn summary(&self) -> MetricsSummary {
        self.acquisition.stats().summary()
    }

    /// Live counters, shareable with other threads
    pub fn metrics(&self) -> Arc<AcquisitionMetrics> {
        self.acquisition.stats().shared()
    }

    /// Run sessions until shutdown.
    ///
    /// The device is closed on every exit path before this returns or before
    /// the next session is opened.
    #[instrument(name = "sensor_daemon", skip_all, fields(class_id = %self.driver.class_id))]
    pub fn run(&mut self, control: &LoopControl) -> Result<DaemonExit> {
        loop {
            let opened = open_with_retry(
                self.loader.as_ref(),
                &self.driver,
                &self.session,
                &control.shutdown,
            );
            let mut session = match opened {
                Ok(Some(session)) => session,
                Ok(None) => {
                    info!("shutdown requested before a session was opened");
                    return Ok(DaemonExit::Shutdown);
                }
                Err(e) => {
                    if let SessionError::RetriesExhausted { attempts, .. } = &e {
                        self.acquisition.stats_mut().on_session_failed(*attempts);
                    }
                    error!(error = %e, "giving up on driver session");
                    return Err(e.into());
                }
            };
            self.acquisition
                .stats_mut()
                .on_session_opened(session.attempts().saturating_sub(1));

            if self.test_mode {
                let count = session.sensors().len();
                info!(sensors = count, "test mode, exiting after enumeration");
                if let Err(e) = session.close() {
                    warn!(error = %e, "device close failed");
                }
                return Ok(DaemonExit::TestMode(count));
            }

            let report = activate_registry(session.device_mut(), self.acquisition.registry());
            info!(
                module = session.module_name(),
                enabled = report.enabled,
                failures = report.failures,
                "sensors activated"
            );

            let exit = self.acquisition.run_session(session.device_mut(), control);

            if let Err(e) = session.close() {
                warn!(error = %e, "device close failed");
            }

            match exit {
                SessionExit::Shutdown => {
                    info!("acquisition stopped");
                    return Ok(DaemonExit::Shutdown);
                }
                SessionExit::Reinit => {
                    info!("reinitializing driver session");
                    self.acquisition.stats_mut().on_reinit();
                }
            }
        }
    }
}
