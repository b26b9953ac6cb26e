//! Sink implementations
//!
//! Contains LogSink, FileSink, NetworkSink and CaptureSink.

mod capture;
mod file;
mod log;
mod network;

pub use self::capture::{CaptureHandle, CaptureSink};
pub use self::file::{FileSink, FileSinkConfig};
pub use self::log::LogSink;
pub use self::network::{NetworkFormat, NetworkSink, NetworkSinkConfig};
