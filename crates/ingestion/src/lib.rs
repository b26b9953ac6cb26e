//! # Ingestion
//!
//! 输入通道模块。
//!
//! 负责：
//! - 帧数据源 (Mock 合成 / JSONL 回放)
//! - 有界订阅队列，满时丢弃并计数
//! - 按到达顺序把 `SensorFrameMessage` 交给组件
//!
//! ## 使用示例
//!
//! ```ignore
//! use ingestion::{MockFrameSource, Subscriber};
//!
//! let mut subscriber = Subscriber::new("/perception/inner/PrefuseFrame", 100);
//! subscriber.register_source(Box::new(MockFrameSource::lidar("lidar128", 10.0)))?;
//! let rx = subscriber.take_receiver().unwrap();
//! subscriber.start_all()?;
//!
//! while let Ok(msg) = rx.recv().await {
//!     component.proc(&msg);
//! }
//! ```

mod config;
mod error;
mod mock;
mod replay;
mod source;
mod subscriber;

pub use config::{IngestionMetrics, IngestionSnapshot};
pub use contracts::SensorFrameMessage;
pub use error::{IngestionError, Result};
pub use mock::{FrameGenerator, MockFrameConfig, MockFrameSource};
pub use replay::{load_recording, ReplayConfig, ReplayFrameSource};
pub use source::{Delivery, FrameSender, FrameSource};
pub use subscriber::{FrameReceiver, Subscriber};
