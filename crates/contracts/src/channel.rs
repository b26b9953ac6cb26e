//! Channel traits - transport capabilities injected into components
//!
//! Components never reach a global transport. They receive a [`Node`] at
//! init time and keep only the writers it hands out.

use std::sync::Arc;

use crate::{ContractError, PrefusedObstacles};

/// Publishing end of one output channel
pub trait ObstacleWriter: Send {
    /// Channel this writer publishes to
    fn channel(&self) -> &str;

    /// Publish one record without blocking
    ///
    /// # Errors
    /// Returns `ChannelFull` / `ChannelClosed` when the transport cannot take the record.
    fn write(&mut self, record: Arc<PrefusedObstacles>) -> Result<(), ContractError>;
}

/// Transport node: creates writers for named channels
pub trait Node {
    type Writer: ObstacleWriter;

    /// Open a writer on `channel`
    ///
    /// # Errors
    /// Returns `ChannelUnavailable` when the channel cannot be opened.
    fn create_writer(&self, channel: &str) -> Result<Self::Writer, ContractError>;
}

/// Message-driven component hosted by the runtime
///
/// The runtime calls `proc` serially, one message at a time.
pub trait Component {
    type Message;

    /// Process one message
    ///
    /// Returns whether the message was handled.
    fn proc(&mut self, msg: &Self::Message) -> bool;
}
