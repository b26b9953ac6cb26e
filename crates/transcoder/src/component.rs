//! PrefuseProxyComponent - transcoder bound to an output channel

use std::sync::Arc;

use contracts::{
    Component, ComponentConfig, Node, ObstacleWriter, PrefusedObstacles, SensorFrameMessage,
};
use observability::record_publish_failure;
use tracing::{info, instrument, warn};

use crate::error::TranscoderError;
use crate::transcoder::Transcoder;

/// Hosted proxy component
///
/// Created only through [`PrefuseProxyComponent::init`], so a component that
/// exists always holds a live writer.
pub struct PrefuseProxyComponent<W: ObstacleWriter> {
    name: String,
    writer: W,
    transcoder: Transcoder,
    publish_failures: u64,
}

impl<W: ObstacleWriter> PrefuseProxyComponent<W> {
    /// Acquire the output writer and reset the sequence counter
    ///
    /// # Errors
    /// `WriterCreation` if the node cannot open `config.output_channel`.
    #[instrument(
        name = "prefuse_proxy_init",
        skip(node, config),
        fields(component = %config.name, channel = %config.output_channel)
    )]
    pub fn init<N>(node: &N, config: &ComponentConfig) -> Result<Self, TranscoderError>
    where
        N: Node<Writer = W>,
    {
        let writer = node
            .create_writer(&config.output_channel)
            .map_err(|source| TranscoderError::WriterCreation {
                channel: config.output_channel.clone(),
                source,
            })?;

        info!(
            component = %config.name,
            input = %config.input_channel,
            output = %config.output_channel,
            "PrefusedProxyComponent init"
        );

        Ok(Self {
            name: config.name.clone(),
            writer,
            transcoder: Transcoder::new(),
            publish_failures: 0,
        })
    }

    /// Component name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Channel records are published to
    pub fn output_channel(&self) -> &str {
        self.writer.channel()
    }

    /// Sequence number the next record will carry
    pub fn sequence_num(&self) -> u32 {
        self.transcoder.sequence_num()
    }

    /// Number of messages processed
    pub fn frames_processed(&self) -> u64 {
        self.transcoder.frames_processed()
    }

    /// Records the transport refused
    pub fn publish_failures(&self) -> u64 {
        self.publish_failures
    }

    /// Transcode one message and hand the record to the writer
    ///
    /// Returns the published record.
    pub fn publish(&mut self, msg: &SensorFrameMessage) -> Arc<PrefusedObstacles> {
        let record = Arc::new(self.transcoder.transcode(msg));

        if let Err(e) = self.writer.write(Arc::clone(&record)) {
            self.publish_failures += 1;
            record_publish_failure(self.writer.channel());
            warn!(
                component = %self.name,
                sequence_num = record.header.sequence_num,
                error = %e,
                "Publish failed"
            );
        }

        record
    }
}

impl<W: ObstacleWriter> Component for PrefuseProxyComponent<W> {
    type Message = SensorFrameMessage;

    fn proc(&mut self, msg: &SensorFrameMessage) -> bool {
        self.publish(msg);
        true
    }
}
