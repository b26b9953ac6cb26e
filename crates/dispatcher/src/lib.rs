//! # Dispatcher
//!
//! 输出通道与数据分发模块。
//!
//! 负责：
//! - 通道注册与 writer 创建 (`ChannelNode`)
//! - 消费发布的 `PrefusedObstacles`
//! - Fan-out 到多个 sinks
//! - 隔离慢 sink，不阻塞主链路

pub mod dispatcher;
pub mod error;
pub mod handle;
pub mod metrics;
pub mod node;
pub mod sinks;

pub use contracts::{DataSink, PrefusedObstacles};
pub use dispatcher::{create_dispatcher, Dispatcher, DispatcherBuilder, DispatcherConfig};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use node::{ChannelNode, ChannelWriter, RecordReceiver};
pub use sinks::{CaptureHandle, CaptureSink, FileSink, LogSink, NetworkSink};
