//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// sensord - sensor acquisition daemon
#[derive(Parser, Debug)]
#[command(
    name = "sensord",
    author,
    version,
    about = "Sensor acquisition daemon",
    long_about = "Binds the sensor hardware module, activates the configured sensors, \n\
                  polls them continuously and publishes canonical event batches. \n\
                  Switches to a low-power sensor set while the device is offroad."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "SENSORD_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "SENSORD_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the acquisition daemon
    Run(RunArgs),

    /// Validate a configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Configuration file (TOML or JSON); built-in defaults when omitted
    #[arg(short, long, env = "SENSORD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the driver module instance (e.g. "simulated", "replay")
    #[arg(long, env = "SENSORD_INSTANCE")]
    pub instance: Option<String>,

    /// Replay a recorded session instead of live hardware
    #[arg(long, env = "SENSORD_REPLAY")]
    pub replay: Option<PathBuf>,

    /// Replay speed multiplier
    #[arg(long, default_value = "1.0")]
    pub replay_speed: f64,

    /// Restart the recording when it ends
    #[arg(long)]
    pub replay_loop: bool,

    /// Override the UDP address for device-state updates
    #[arg(long, env = "SENSORD_STATE_ADDR")]
    pub state_addr: Option<String>,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "SENSORD_METRICS_PORT")]
    pub metrics_port: u16,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Configuration file to validate
    #[arg(short, long, default_value = "sensord.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Configuration file; built-in defaults when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,

    /// Show sink configuration
    #[arg(long)]
    pub sinks: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => observability::LogFormat::Json,
            LogFormat::Pretty => observability::LogFormat::Pretty,
            LogFormat::Compact => observability::LogFormat::Compact,
        }
    }
}
