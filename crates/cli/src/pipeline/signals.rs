//! Process signals mapped onto loop control flags
//!
//! SIGINT and SIGTERM request shutdown; SIGHUP and SIGUSR1 request a session
//! reinit. Handlers only raise flags, the acquisition thread acts on them.

use ingestion::LoopControl;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::{CliError, Result};

#[cfg(unix)]
pub fn install(control: &LoopControl) -> Result<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};

    let listen = |kind: SignalKind, name: &'static str| {
        signal(kind).map_err(|source| CliError::Signal {
            signal: name,
            source,
        })
    };

    let mut interrupt = listen(SignalKind::interrupt(), "SIGINT")?;
    let mut terminate = listen(SignalKind::terminate(), "SIGTERM")?;
    let mut hangup = listen(SignalKind::hangup(), "SIGHUP")?;
    let mut user1 = listen(SignalKind::user_defined1(), "SIGUSR1")?;

    let control = control.clone();
    Ok(tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = interrupt.recv() => {
                    warn!("SIGINT received, shutting down");
                    control.shutdown.request();
                }
                _ = terminate.recv() => {
                    warn!("SIGTERM received, shutting down");
                    control.shutdown.request();
                }
                _ = hangup.recv() => {
                    info!("SIGHUP received, reinitializing session");
                    control.reinit.request();
                }
                _ = user1.recv() => {
                    info!("SIGUSR1 received, reinitializing session");
                    control.reinit.request();
                }
            }
        }
    }))
}

#[cfg(not(unix))]
pub fn install(control: &LoopControl) -> Result<JoinHandle<()>> {
    let control = control.clone();
    Ok(tokio::spawn(async move {
        loop {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    warn!("Ctrl+C received, shutting down");
                    control.shutdown.request();
                }
                Err(e) => {
                    warn!(error = %e, "Ctrl+C handler failed");
                    return;
                }
            }
        }
    }))
}
