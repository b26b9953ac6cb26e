//! Transcoder error types

use thiserror::Error;

/// Component lifecycle errors
///
/// Per-frame processing has no failure mode; only init can fail.
#[derive(Debug, Error)]
pub enum TranscoderError {
    /// Output channel could not be opened
    #[error("failed to create writer on '{channel}': {source}")]
    WriterCreation {
        channel: String,
        #[source]
        source: contracts::ContractError,
    },
}
