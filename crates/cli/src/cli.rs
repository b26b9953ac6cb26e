//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Prefuse Proxy - republishes sensor-fusion frames as PrefusedObstacles
#[derive(Parser, Debug)]
#[command(
    name = "prefuse-proxy",
    author,
    version,
    about = "Prefuse proxy: SensorFrameMessage to PrefusedObstacles transcoder",
    long_about = "Hosts the prefuse proxy component.\n\n\
                  Subscribes to the sensor-fusion frame channel (mock or replayed), \n\
                  re-encodes every frame as a sequenced PrefusedObstacles record and \n\
                  dispatches the records to the configured sinks."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "PREFUSE_PROXY_VERBOSE")]
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
        env = "PREFUSE_PROXY_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the proxy
    Run(RunArgs),

    /// Validate configuration file without running
    Validate(ValidateArgs),

    /// Display configuration information
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Path to configuration file (TOML or JSON)
    #[arg(
        short,
        long,
        default_value = "prefuse_proxy.toml",
        env = "PREFUSE_PROXY_CONFIG"
    )]
    pub config: PathBuf,

    /// Override the subscribed channel
    #[arg(long, env = "PREFUSE_PROXY_INPUT_CHANNEL")]
    pub input_channel: Option<String>,

    /// Override the published channel
    #[arg(long, env = "PREFUSE_PROXY_OUTPUT_CHANNEL")]
    pub output_channel: Option<String>,

    /// Stop after this many frames (0 = unlimited)
    #[arg(long, default_value = "0", env = "PREFUSE_PROXY_MAX_FRAMES")]
    pub max_frames: u64,

    /// Run timeout in seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "PREFUSE_PROXY_TIMEOUT")]
    pub timeout: u64,

    /// Validate configuration and exit without running
    #[arg(long)]
    pub dry_run: bool,

    /// Inbound queue size
    #[arg(long, default_value = "100", env = "PREFUSE_PROXY_BUFFER_SIZE")]
    pub buffer_size: usize,

    /// Metrics server port (0 = disabled)
    #[arg(long, default_value = "9000", env = "PREFUSE_PROXY_METRICS_PORT")]
    pub metrics_port: u16,

    /// Replay a JSONL recording instead of the configured source
    #[arg(long, env = "PREFUSE_PROXY_REPLAY")]
    pub replay: Option<PathBuf>,

    /// Replay speed multiplier (1.0 = recorded timing)
    #[arg(long, default_value = "1.0")]
    pub replay_speed: f64,

    /// Loop the recording when it ends
    #[arg(long)]
    pub replay_loop: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Path to configuration file to validate
    #[arg(short, long, default_value = "prefuse_proxy.toml")]
    pub config: PathBuf,

    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "prefuse_proxy.toml")]
    pub config: PathBuf,

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
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_overrides() {
        let cli = Cli::parse_from([
            "prefuse-proxy",
            "-v",
            "run",
            "--config",
            "proxy.toml",
            "--output-channel",
            "/apollo/prefuse_test",
            "--max-frames",
            "10",
            "--replay",
            "frames.jsonl",
            "--replay-speed",
            "2.0",
        ]);

        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.config, PathBuf::from("proxy.toml"));
                assert_eq!(args.output_channel.as_deref(), Some("/apollo/prefuse_test"));
                assert_eq!(args.max_frames, 10);
                assert_eq!(args.replay, Some(PathBuf::from("frames.jsonl")));
                assert_eq!(args.replay_speed, 2.0);
                assert!(!args.replay_loop);
            }
            other => panic!("expected run, got {other:?}"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        let result = Cli::try_parse_from(["prefuse-proxy", "-q", "-v", "validate"]);
        assert!(result.is_err());
    }
}
