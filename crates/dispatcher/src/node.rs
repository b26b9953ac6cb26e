//! ChannelNode - in-process channel registry and writers
//!
//! A channel must be advertised (which hands out its receiving end) before a
//! writer can be created on it.

use std::collections::HashMap;
use std::sync::Arc;

use contracts::{ContractError, Node, ObstacleWriter, PrefusedObstacles};
use observability::record_queue_depth;
use tokio::sync::mpsc;
use tracing::{debug, instrument};

/// Receiving end of an advertised channel
pub type RecordReceiver = mpsc::Receiver<Arc<PrefusedObstacles>>;

/// Registry of named output channels
#[derive(Debug, Default)]
pub struct ChannelNode {
    name: String,
    channels: HashMap<String, mpsc::Sender<Arc<PrefusedObstacles>>>,
}

impl ChannelNode {
    /// Create an empty node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            channels: HashMap::new(),
        }
    }

    /// Node name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register `channel` with a bounded queue and return its receiver
    ///
    /// # Errors
    /// `ChannelUnavailable` if the channel is already advertised or `capacity` is 0.
    #[instrument(name = "channel_node_advertise", skip(self), fields(node = %self.name))]
    pub fn advertise(
        &mut self,
        channel: &str,
        capacity: usize,
    ) -> Result<RecordReceiver, ContractError> {
        if capacity == 0 {
            return Err(ContractError::channel_unavailable(
                channel,
                "capacity must be > 0",
            ));
        }
        if self.channels.contains_key(channel) {
            return Err(ContractError::channel_unavailable(
                channel,
                "already advertised",
            ));
        }

        let (tx, rx) = mpsc::channel(capacity);
        self.channels.insert(channel.to_string(), tx);
        debug!(node = %self.name, channel, capacity, "Channel advertised");
        Ok(rx)
    }

    /// Whether `channel` has been advertised
    pub fn has_channel(&self, channel: &str) -> bool {
        self.channels.contains_key(channel)
    }

    /// Advertised channel names, sorted
    pub fn channels(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.channels.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Node for ChannelNode {
    type Writer = ChannelWriter;

    fn create_writer(&self, channel: &str) -> Result<ChannelWriter, ContractError> {
        let tx = self
            .channels
            .get(channel)
            .ok_or_else(|| ContractError::channel_unavailable(channel, "not advertised"))?;

        if tx.is_closed() {
            return Err(ContractError::channel_unavailable(
                channel,
                "receiver dropped",
            ));
        }

        debug!(node = %self.name, channel, "Writer created");
        Ok(ChannelWriter {
            channel: channel.to_string(),
            tx: tx.clone(),
        })
    }
}

/// Non-blocking writer on one advertised channel
#[derive(Debug, Clone)]
pub struct ChannelWriter {
    channel: String,
    tx: mpsc::Sender<Arc<PrefusedObstacles>>,
}

impl ChannelWriter {
    /// Records currently queued
    pub fn queue_len(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }
}

impl ObstacleWriter for ChannelWriter {
    fn channel(&self) -> &str {
        &self.channel
    }

    fn write(&mut self, record: Arc<PrefusedObstacles>) -> Result<(), ContractError> {
        match self.tx.try_send(record) {
            Ok(()) => {
                record_queue_depth(&self.channel, self.queue_len());
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => Err(ContractError::ChannelFull {
                channel: self.channel.clone(),
                capacity: self.tx.max_capacity(),
            }),
            Err(mpsc::error::TrySendError::Closed(_)) => Err(ContractError::ChannelClosed {
                channel: self.channel.clone(),
            }),
        }
    }
}
