//! Pipeline orchestrator - hosts the proxy component.
//!
//! Wires subscriber → component → output channel → dispatcher, then drives
//! the component until the input ends, a limit is hit or shutdown is requested.

use std::future::Future;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use contracts::{ProxyBlueprint, SourceConfig, SourceKind};
use dispatcher::ChannelNode;
use ingestion::{
    FrameReceiver, FrameSource, MockFrameConfig, MockFrameSource, ReplayConfig, ReplayFrameSource,
    Subscriber,
};
use tracing::{debug, info, instrument, warn};
use transcoder::PrefuseProxyComponent;

use super::{PipelineStats, StopReason};
use crate::error::CliError;

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// The proxy blueprint configuration
    pub blueprint: ProxyBlueprint,

    /// Maximum number of frames to process (None = unlimited)
    pub max_frames: Option<u64>,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Inbound queue size
    pub buffer_size: usize,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,

    /// Time allowed for sinks to drain after the input stops
    pub drain_timeout: Duration,
}

impl PipelineConfig {
    pub fn new(blueprint: ProxyBlueprint) -> Self {
        Self {
            blueprint,
            max_frames: None,
            timeout: None,
            buffer_size: 100,
            metrics_port: None,
            drain_timeout: Duration::from_secs(5),
        }
    }
}

/// Main pipeline orchestrator
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline with the given configuration
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run until the input closes, a limit is reached or `shutdown` resolves
    #[instrument(name = "pipeline_run", skip(self, shutdown))]
    pub async fn run<F>(self, shutdown: F) -> Result<PipelineStats>
    where
        F: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;
        let component_config = &blueprint.component;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        // Output side first: the writer needs an advertised channel
        info!("Setting up output channel...");
        let mut node = ChannelNode::new(&component_config.name);
        let record_rx = node
            .advertise(
                &component_config.output_channel,
                component_config.channel_capacity,
            )
            .context("Failed to advertise output channel")?;

        if blueprint.sinks.is_empty() {
            warn!("No sinks configured - published records will be discarded");
        }
        let dispatcher = dispatcher::create_dispatcher(
            &component_config.output_channel,
            blueprint.sinks.clone(),
            record_rx,
        )
        .await
        .context("Failed to create dispatcher")?;
        let dispatcher_handle = dispatcher.spawn();
        info!(sinks = blueprint.sinks.len(), "Dispatcher started");

        let mut component = PrefuseProxyComponent::init(&node, component_config)
            .context("Failed to initialize prefuse proxy component")?;

        // Input side
        info!("Setting up subscriber...");
        let source = build_source(&blueprint.source)?;
        let mut subscriber =
            Subscriber::new(&component_config.input_channel, self.config.buffer_size);
        subscriber
            .register_source(source)
            .context("Failed to register frame source")?;
        let frames = subscriber
            .take_receiver()
            .ok_or_else(|| CliError::pipeline_execution("subscriber receiver already taken"))?;
        subscriber
            .start_all()
            .context("Failed to start frame source")?;

        info!(
            input = %component_config.input_channel,
            output = %component_config.output_channel,
            max_frames = ?self.config.max_frames,
            timeout = ?self.config.timeout,
            "Pipeline running"
        );

        let mut stats = PipelineStats {
            active_sinks: blueprint.sinks.len(),
            ..Default::default()
        };
        let stop_reason = drive(
            &mut component,
            &frames,
            &mut stats,
            self.config.max_frames,
            self.config.timeout,
            shutdown,
        )
        .await;
        stats.stop_reason = stop_reason;

        // Shutdown
        info!(reason = %stats.stop_reason, "Shutting down pipeline...");
        subscriber.stop_all();

        stats.publish_failures = component.publish_failures();
        stats.next_sequence_num = component.sequence_num();
        let inbound = subscriber.metrics().snapshot();
        stats.frames_received = inbound.frames_received;
        stats.frames_dropped = inbound.frames_dropped;

        // Dropping the last writer and the node closes the output channel
        drop(component);
        drop(node);

        match tokio::time::timeout(self.config.drain_timeout, dispatcher_handle).await {
            Ok(Ok(sink_metrics)) => stats.sink_metrics = sink_metrics,
            Ok(Err(e)) => warn!(error = %e, "Dispatcher task failed"),
            Err(_) => warn!(
                timeout_secs = self.config.drain_timeout.as_secs_f64(),
                "Sinks did not drain in time"
            ),
        }

        stats.duration = start_time.elapsed();
        info!(
            duration_secs = stats.duration.as_secs_f64(),
            records = stats.records_published,
            fps = format!("{:.2}", stats.fps()),
            "Pipeline shutdown complete"
        );

        Ok(stats)
    }
}

/// Main loop: one `publish` per received frame
async fn drive<W, F>(
    component: &mut PrefuseProxyComponent<W>,
    frames: &FrameReceiver,
    stats: &mut PipelineStats,
    max_frames: Option<u64>,
    timeout: Option<Duration>,
    shutdown: F,
) -> StopReason
where
    W: contracts::ObstacleWriter,
    F: Future<Output = ()>,
{
    let deadline = async {
        match timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => return StopReason::Signal,
            _ = &mut deadline => {
                warn!("Pipeline timed out");
                return StopReason::Timeout;
            }
            received = frames.recv() => {
                let Ok(msg) = received else {
                    return StopReason::InputClosed;
                };

                let record = component.publish(&msg);
                stats.records_published += 1;
                stats.transcode.update(&record, msg.frame.is_some());

                if stats.records_published % 100 == 0 {
                    debug!(
                        records = stats.records_published,
                        sequence_num = record.header.sequence_num,
                        "Pipeline progress"
                    );
                }

                if max_frames.is_some_and(|max| stats.records_published >= max) {
                    info!(frames = stats.records_published, "Reached max frames limit");
                    return StopReason::MaxFrames;
                }
            }
        }
    }
}

/// Build the configured frame source
fn build_source(config: &SourceConfig) -> Result<Box<dyn FrameSource>> {
    match config.kind {
        SourceKind::Mock => {
            info!(
                sensor_id = %config.sensor_id,
                frequency_hz = config.frequency_hz,
                "Running with MOCK frame source"
            );
            Ok(Box::new(MockFrameSource::new(MockFrameConfig::from(config))))
        }
        SourceKind::Replay => {
            let replay = ReplayConfig::from_source(config).ok_or_else(|| {
                CliError::config_validation("replay source requires replay_path")
            })?;
            info!(path = %replay.path.display(), "Running in REPLAY mode");
            let path: PathBuf = replay.path.clone();
            let source = ReplayFrameSource::open(replay)
                .with_context(|| format!("Failed to open recording {}", path.display()))?;
            Ok(Box::new(source))
        }
    }
}
