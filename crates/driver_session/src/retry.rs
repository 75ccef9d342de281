//! Session open with exponential backoff

use std::thread;
use std::time::{Duration, Instant};

use contracts::{ControlSignal, DriverConfig, ModuleLoader, SessionConfig};
use tracing::{info, warn};

use crate::error::{Result, SessionError};
use crate::session::DriverSession;

/// Longest uninterrupted sleep while waiting for the next attempt
const WAIT_SLICE: Duration = Duration::from_millis(50);

/// Open a session, retrying per `policy`.
///
/// Returns `Ok(None)` when `shutdown` is raised before a session is obtained.
/// `policy.max_attempts == 0` retries until shutdown.
pub fn open_with_retry(
    loader: &dyn ModuleLoader,
    driver: &DriverConfig,
    policy: &SessionConfig,
    shutdown: &ControlSignal,
) -> Result<Option<DriverSession>> {
    let backoff = policy.backoff();
    let mut attempt: u32 = 0;

    loop {
        if shutdown.is_requested() {
            return Ok(None);
        }

        attempt += 1;
        let err = match DriverSession::open(loader, driver) {
            Ok(session) => {
                if attempt > 1 {
                    info!(attempts = attempt, "driver session opened after retry");
                }
                return Ok(Some(session.with_attempts(attempt)));
            }
            Err(err) => err,
        };

        if policy.max_attempts != 0 && attempt >= policy.max_attempts {
            return Err(SessionError::RetriesExhausted {
                attempts: attempt,
                source: Box::new(err),
            });
        }

        let delay = backoff.delay_for(attempt - 1);
        warn!(
            attempt,
            error = %err,
            retry_in_ms = delay.as_millis() as u64,
            "driver session open failed"
        );

        if !wait_unless(shutdown, delay) {
            return Ok(None);
        }
    }
}

/// Sleep for `total`; false if `signal` was raised meanwhile
fn wait_unless(signal: &ControlSignal, total: Duration) -> bool {
    let deadline = Instant::now() + total;
    loop {
        if signal.is_requested() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        thread::sleep((deadline - now).min(WAIT_SLICE));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockDriver;

    fn fast_policy(max_attempts: u32) -> SessionConfig {
        SessionConfig {
            max_attempts,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
        }
    }

    #[test]
    fn test_recovers_after_transient_failures() {
        let driver = MockDriver::new().fail_load(1).fail_open(2);
        let session = open_with_retry(
            &driver,
            &DriverConfig::default(),
            &fast_policy(5),
            &ControlSignal::new(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(session.attempts(), 4);
        assert_eq!(driver.open_count(), 1);
    }

    #[test]
    fn test_gives_up_after_max_attempts() {
        let driver = MockDriver::new().fail_open(10);
        let err = open_with_retry(
            &driver,
            &DriverConfig::default(),
            &fast_policy(3),
            &ControlSignal::new(),
        )
        .err()
        .unwrap();

        match err {
            SessionError::RetriesExhausted { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_shutdown_interrupts_retry() {
        let shutdown = ControlSignal::new();
        shutdown.request();
        let driver = MockDriver::new().fail_open(10);

        let outcome =
            open_with_retry(&driver, &DriverConfig::default(), &fast_policy(0), &shutdown).unwrap();
        assert!(outcome.is_none());
        assert_eq!(driver.open_count(), 0);
    }
}
