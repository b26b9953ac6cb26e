//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{ProxyBlueprint, SourceKind};
use std::time::Duration;
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::error::CliError;
use crate::pipeline::{Pipeline, PipelineConfig, StopReason};

/// Execute the `run` command
pub async fn run_pipeline(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut blueprint, args);

    // Overrides may break cross-field rules (e.g. input == output)
    config_loader::validate(&blueprint)
        .map_err(|e| CliError::config_validation(e.to_string()))?;

    info!(
        component = %blueprint.component.name,
        input = %blueprint.component.input_channel,
        output = %blueprint.component.output_channel,
        source = ?blueprint.source.kind,
        sinks = blueprint.sinks.len(),
        "Configuration loaded"
    );

    // Dry run - just validate and exit
    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        max_frames: (args.max_frames > 0).then_some(args.max_frames),
        timeout: (args.timeout > 0).then(|| Duration::from_secs(args.timeout)),
        buffer_size: args.buffer_size,
        metrics_port: (args.metrics_port > 0).then_some(args.metrics_port),
        ..PipelineConfig::new(blueprint)
    };

    info!("Starting pipeline...");
    let stats = Pipeline::new(pipeline_config)
        .run(setup_shutdown_signal())
        .await
        .map_err(|e| CliError::pipeline_execution(format!("{e:#}")))?;

    if stats.stop_reason == StopReason::Signal {
        warn!("Received shutdown signal, pipeline stopped");
    }
    info!(
        records = stats.records_published,
        publish_failures = stats.publish_failures,
        frames_dropped = stats.frames_dropped,
        duration_secs = stats.duration.as_secs_f64(),
        fps = format!("{:.2}", stats.fps()),
        "Pipeline completed successfully"
    );
    stats.print_summary();

    info!("Prefuse proxy finished");
    Ok(())
}

/// CLI flags take precedence over the config file
fn apply_overrides(blueprint: &mut ProxyBlueprint, args: &RunArgs) {
    if let Some(ref channel) = args.input_channel {
        info!(channel = %channel, "Overriding input channel from CLI");
        blueprint.component.input_channel = channel.clone();
    }
    if let Some(ref channel) = args.output_channel {
        info!(channel = %channel, "Overriding output channel from CLI");
        blueprint.component.output_channel = channel.clone();
    }
    if let Some(ref path) = args.replay {
        info!(path = %path.display(), speed = args.replay_speed, "Replay mode from CLI");
        let source = &mut blueprint.source;
        source.kind = SourceKind::Replay;
        source.replay_path = Some(path.clone());
        source.speed_multiplier = args.replay_speed;
        source.loop_playback = args.replay_loop;
    }
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn setup_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &ProxyBlueprint) {
    let component = &blueprint.component;
    println!("\n=== Configuration Summary ===\n");
    println!("Component: {}", component.name);
    println!("  Input:  {}", component.input_channel);
    println!(
        "  Output: {} (capacity {})",
        component.output_channel, component.channel_capacity
    );

    let source = &blueprint.source;
    println!("\nSource ({:?}):", source.kind);
    match source.kind {
        SourceKind::Mock => {
            println!("  Sensor: {} @ {} Hz", source.sensor_id, source.frequency_hz);
            println!(
                "  Objects: <= {} per frame, <= {} hull points, empty ratio {}",
                source.max_objects, source.max_polygon_points, source.empty_ratio
            );
        }
        SourceKind::Replay => {
            if let Some(ref path) = source.replay_path {
                println!("  Recording: {}", path.display());
            }
            println!(
                "  Speed: {}x{}",
                source.speed_multiplier,
                if source.loop_playback { " (loop)" } else { "" }
            );
        }
    }

    if !blueprint.sinks.is_empty() {
        println!("\nSinks ({}):", blueprint.sinks.len());
        for sink in &blueprint.sinks {
            println!("  - {} ({:?})", sink.name, sink.sink_type);
        }
    }

    println!();
}
