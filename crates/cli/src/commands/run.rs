//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{ReplayConfig, SensordBlueprint};
use tracing::info;

use super::load_blueprint;
use crate::cli::RunArgs;
use crate::pipeline::{Orchestrator, OrchestratorConfig, RunExit};

/// Presence of this variable switches to the enumerate-and-exit mode
pub const TEST_MODE_ENV: &str = "SENSOR_TEST";

/// Execute the `run` command
pub async fn run_daemon(args: &RunArgs) -> Result<RunExit> {
    let mut blueprint = load_blueprint(args.config.as_deref())
        .context("failed to load configuration")?;
    apply_overrides(&mut blueprint, args);
    config_loader::ConfigLoader::validate(&blueprint)
        .context("configuration invalid after command-line overrides")?;

    info!(
        class_id = %blueprint.driver.class_id,
        instance = ?blueprint.driver.instance,
        sensors = blueprint.sensors.len(),
        sinks = blueprint.sinks.len(),
        "configuration loaded"
    );

    if args.dry_run {
        info!("dry run, configuration is valid");
        print_config_summary(&blueprint);
        return Ok(RunExit::Shutdown);
    }

    let test_mode = std::env::var_os(TEST_MODE_ENV).is_some();
    let config = OrchestratorConfig {
        blueprint,
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
        test_mode,
    };

    let stats = Orchestrator::new(config)
        .run()
        .await
        .context("daemon execution failed")?;

    stats.print_summary();
    info!(
        batches = stats.summary.total_batches,
        duration_secs = stats.duration.as_secs_f64(),
        "sensord finished"
    );
    Ok(stats.exit)
}

fn apply_overrides(blueprint: &mut SensordBlueprint, args: &RunArgs) {
    if let Some(path) = &args.replay {
        info!(path = %path.display(), "replaying recorded session");
        blueprint.driver.replay = Some(ReplayConfig {
            path: path.display().to_string(),
            speed: args.replay_speed,
            loop_playback: args.replay_loop,
        });
        blueprint.driver.instance = Some("replay".to_string());
    }
    if let Some(instance) = &args.instance {
        info!(instance = %instance, "overriding driver instance");
        blueprint.driver.instance = Some(instance.clone());
    }
    if let Some(addr) = &args.state_addr {
        blueprint.state.listen_addr = Some(addr.clone());
    }
}

fn print_config_summary(blueprint: &SensordBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Driver:");
    println!("  Class: {}", blueprint.driver.class_id);
    println!(
        "  Instance: {}",
        blueprint.driver.instance.as_deref().unwrap_or("(default)")
    );
    println!("\nSensors ({}):", blueprint.sensors.len());
    for sensor in &blueprint.sensors {
        println!(
            "  - [{}] {} every {} ms{}",
            sensor.handle,
            sensor.name,
            sensor.interval_ms,
            if sensor.offroad { " (offroad)" } else { "" }
        );
    }
    println!("\nSinks ({}):", blueprint.sinks.len());
    for sink in &blueprint.sinks {
        println!("  - {} ({:?})", sink.name, sink.sink_type);
    }
    println!();
}
