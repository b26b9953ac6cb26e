//! Dispatcher - main loop for fan-out to sinks

use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use contracts::{PrefusedObstacles, SinkConfig, SinkType};

use crate::error::DispatcherError;
use crate::handle::SinkHandle;
use crate::metrics::{MetricsSnapshot, SinkMetrics};
use crate::node::RecordReceiver;
use crate::sinks::{FileSink, LogSink, NetworkSink};

/// Dispatcher configuration
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Channel this dispatcher drains
    pub channel: String,
    /// Sink configurations
    pub sinks: Vec<SinkConfig>,
}

/// Builder for creating a Dispatcher
pub struct DispatcherBuilder {
    config: DispatcherConfig,
    input_rx: RecordReceiver,
}

impl DispatcherBuilder {
    pub fn new(config: DispatcherConfig, input_rx: RecordReceiver) -> Self {
        Self { config, input_rx }
    }

    /// Build and start the sink workers
    #[instrument(name = "dispatcher_builder_build", skip(self), fields(channel = %self.config.channel))]
    pub async fn build(self) -> Result<Dispatcher, DispatcherError> {
        let handles = Self::initialize_handles(&self.config).await?;

        Ok(Dispatcher {
            channel: self.config.channel,
            handles,
            input_rx: self.input_rx,
        })
    }

    #[instrument(
        name = "dispatcher_initialize_handles",
        skip(config),
        fields(sink_count = config.sinks.len())
    )]
    async fn initialize_handles(
        config: &DispatcherConfig,
    ) -> Result<Vec<SinkHandle>, DispatcherError> {
        let mut seen = HashSet::new();
        for sink_config in &config.sinks {
            if !seen.insert(sink_config.name.as_str()) {
                return Err(DispatcherError::DuplicateSink {
                    name: sink_config.name.clone(),
                });
            }
        }

        let mut handles = Vec::with_capacity(config.sinks.len());
        for sink_config in &config.sinks {
            handles.push(create_sink_handle(sink_config).await?);
        }
        Ok(handles)
    }
}

/// Create a SinkHandle from configuration
#[instrument(
    name = "dispatcher_create_sink_handle",
    skip(config),
    fields(sink = %config.name, sink_type = ?config.sink_type)
)]
async fn create_sink_handle(config: &SinkConfig) -> Result<SinkHandle, DispatcherError> {
    match config.sink_type {
        SinkType::Log => {
            let sink = LogSink::new(&config.name);
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::File => {
            let sink = FileSink::from_params(&config.name, &config.params)
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
        SinkType::Network => {
            let sink = NetworkSink::from_params(&config.name, &config.params)
                .await
                .map_err(|e| DispatcherError::sink_creation(&config.name, e.to_string()))?;
            Ok(SinkHandle::spawn(sink, config.queue_capacity))
        }
    }
}

/// Drains one output channel and fans records out to sinks
pub struct Dispatcher {
    channel: String,
    handles: Vec<SinkHandle>,
    input_rx: RecordReceiver,
}

impl Dispatcher {
    /// Create a dispatcher with custom sink handles (capture sinks, tests)
    pub fn with_handles(
        channel: impl Into<String>,
        handles: Vec<SinkHandle>,
        input_rx: RecordReceiver,
    ) -> Self {
        Self {
            channel: channel.into(),
            handles,
            input_rx,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Get metrics for all sinks
    pub fn metrics(&self) -> Vec<(String, MetricsSnapshot)> {
        self.handles
            .iter()
            .map(|h| (h.name().to_string(), h.metrics().snapshot()))
            .collect()
    }

    /// Run the dispatcher main loop
    ///
    /// Returns per-sink metrics once every writer on the channel is gone.
    #[instrument(name = "dispatcher_run", skip(self), fields(channel = %self.channel))]
    pub async fn run(mut self) -> Vec<(String, MetricsSnapshot)> {
        info!(channel = %self.channel, sinks = self.handles.len(), "Dispatcher started");
        if self.handles.is_empty() {
            warn!(channel = %self.channel, "No sinks attached, records will be discarded");
        }

        let mut record_count: u64 = 0;

        while let Some(record) = self.input_rx.recv().await {
            record_count += 1;
            self.dispatch_record(&record);

            if record_count.is_multiple_of(100) {
                debug!(records = record_count, "Dispatcher progress");
            }
        }

        info!(
            records = record_count,
            "Dispatcher input closed, shutting down"
        );

        let sink_metrics: Vec<(String, Arc<SinkMetrics>)> = self
            .handles
            .iter()
            .map(|h| (h.name().to_string(), Arc::clone(h.metrics())))
            .collect();
        Self::shutdown_handles(self.handles).await;

        info!("Dispatcher shutdown complete");
        sink_metrics
            .into_iter()
            .map(|(name, metrics)| (name, metrics.snapshot()))
            .collect()
    }

    /// Spawn the dispatcher as a background task
    pub fn spawn(self) -> JoinHandle<Vec<(String, MetricsSnapshot)>> {
        tokio::spawn(self.run())
    }

    fn dispatch_record(&self, record: &Arc<PrefusedObstacles>) {
        for handle in &self.handles {
            handle.try_send(Arc::clone(record));
        }
    }

    async fn shutdown_handles(handles: Vec<SinkHandle>) {
        for handle in handles {
            handle.shutdown().await;
        }
    }
}

/// Convenience function to create a dispatcher from sink configs
#[instrument(name = "dispatcher_create", skip(sink_configs, input_rx))]
pub async fn create_dispatcher(
    channel: &str,
    sink_configs: Vec<SinkConfig>,
    input_rx: RecordReceiver,
) -> Result<Dispatcher, DispatcherError> {
    let config = DispatcherConfig {
        channel: channel.to_string(),
        sinks: sink_configs,
    };
    DispatcherBuilder::new(config, input_rx).build().await
}
