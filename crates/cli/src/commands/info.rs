//! `info` command implementation.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use contracts::{ProxyBlueprint, SourceKind};
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::error::CliError;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    component: ComponentInfo,
    source: SourceInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<SinkInfo>,
}

#[derive(Serialize)]
struct ComponentInfo {
    name: String,
    input_channel: String,
    output_channel: String,
    channel_capacity: usize,
}

#[derive(Serialize)]
struct SourceInfo {
    kind: String,
    sensor_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    frequency_hz: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    replay_path: Option<String>,
}

#[derive(Serialize)]
struct SinkInfo {
    name: String,
    sink_type: String,
    queue_capacity: usize,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    params: BTreeMap<String, String>,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        return Err(CliError::config_not_found(&args.config).into());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn build_config_info(blueprint: &ProxyBlueprint, args: &InfoArgs) -> ConfigInfo {
    let component = &blueprint.component;
    let source = &blueprint.source;
    let is_mock = source.kind == SourceKind::Mock;

    let sinks = if args.sinks {
        blueprint
            .sinks
            .iter()
            .map(|s| SinkInfo {
                name: s.name.clone(),
                sink_type: format!("{:?}", s.sink_type),
                queue_capacity: s.queue_capacity,
                params: s.params.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        component: ComponentInfo {
            name: component.name.clone(),
            input_channel: component.input_channel.clone(),
            output_channel: component.output_channel.clone(),
            channel_capacity: component.channel_capacity,
        },
        source: SourceInfo {
            kind: format!("{:?}", source.kind),
            sensor_id: source.sensor_id.clone(),
            frequency_hz: is_mock.then_some(source.frequency_hz),
            seed: source.seed.filter(|_| is_mock),
            replay_path: source
                .replay_path
                .as_ref()
                .filter(|_| !is_mock)
                .map(|p| p.display().to_string()),
        },
        sinks,
    }
}

fn print_config_info(blueprint: &ProxyBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║               Prefuse Proxy Configuration                    ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let component = &blueprint.component;
    println!("🧩 Component");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Name: {}", component.name);
    println!("   ├─ Input: {}", component.input_channel);
    println!("   ├─ Output: {}", component.output_channel);
    println!("   └─ Channel capacity: {}", component.channel_capacity);

    let source = &blueprint.source;
    println!("\n📡 Source ({:?})", source.kind);
    match source.kind {
        SourceKind::Mock => {
            println!("   ├─ Sensor: {}", source.sensor_id);
            println!("   ├─ Frequency: {} Hz", source.frequency_hz);
            println!(
                "   ├─ Objects per frame: 0..={} ({} polygon points max)",
                source.max_objects, source.max_polygon_points
            );
            println!("   ├─ Empty ratio: {:.2}", source.empty_ratio);
            match source.seed {
                Some(seed) => println!("   └─ Seed: {}", seed),
                None => println!("   └─ Seed: (random)"),
            }
        }
        SourceKind::Replay => {
            if let Some(ref path) = source.replay_path {
                println!("   ├─ File: {}", path.display());
            }
            println!("   ├─ Speed: {}x", source.speed_multiplier);
            println!("   └─ Loop: {}", source.loop_playback);
        }
    }

    if blueprint.sinks.is_empty() {
        println!("\n📤 Sinks: none");
    } else {
        println!("\n📤 Sinks ({})", blueprint.sinks.len());
        for (i, sink) in blueprint.sinks.iter().enumerate() {
            let is_last = i == blueprint.sinks.len() - 1;
            let prefix = if is_last { "└─" } else { "├─" };
            let child_prefix = if is_last { "   " } else { "│  " };
            println!("   {} {} ({:?})", prefix, sink.name, sink.sink_type);

            if args.sinks {
                println!("   {}  ├─ Queue capacity: {}", child_prefix, sink.queue_capacity);
                let params: BTreeMap<_, _> = sink.params.iter().collect();
                println!("   {}  └─ Params: {:?}", child_prefix, params);
            }
        }
    }

    println!();
}
