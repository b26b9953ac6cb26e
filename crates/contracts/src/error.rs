//! Layered error definitions
//!
//! Categorized by source: config / channel / sink / source

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Channel Errors =====
    /// Channel cannot be opened for writing
    #[error("channel '{channel}' unavailable: {message}")]
    ChannelUnavailable { channel: String, message: String },

    /// Channel queue is full, record not accepted
    #[error("channel '{channel}' full: capacity={capacity}")]
    ChannelFull { channel: String, capacity: usize },

    /// Channel receiver has gone away
    #[error("channel '{channel}' closed")]
    ChannelClosed { channel: String },

    // ===== Source Errors =====
    /// Frame source error (replay file, decode)
    #[error("frame source '{source_name}' error: {message}")]
    FrameSource {
        source_name: String,
        message: String,
    },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Sink connection error
    #[error("sink '{sink_name}' connection error: {message}")]
    SinkConnection { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create channel unavailable error
    pub fn channel_unavailable(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ChannelUnavailable {
            channel: channel.into(),
            message: message.into(),
        }
    }

    /// Create frame source error
    pub fn frame_source(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FrameSource {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }
}
