//! # Transcoder
//!
//! Prefuse proxy 核心：`SensorFrameMessage` → `PrefusedObstacles`。
//!
//! 负责：
//! - 逐帧转码（几何、朝向、类别映射）
//! - 维护组件内单调递增的序列号
//! - 每帧发布恰好一条记录（空帧也发布）
//!
//! ## 使用示例
//!
//! ```ignore
//! use transcoder::PrefuseProxyComponent;
//! use contracts::{Component, ComponentConfig};
//!
//! let mut component = PrefuseProxyComponent::init(&node, &ComponentConfig::default())?;
//!
//! // Runtime delivers messages serially
//! component.proc(&msg);
//! ```

mod component;
mod error;
pub mod mapping;
mod transcoder;

pub use component::PrefuseProxyComponent;
pub use error::TranscoderError;
pub use mapping::{map_object_sub_type, map_object_type};
pub use transcoder::Transcoder;

// Re-export contracts types
pub use contracts::{PrefusedObstacles, SensorFrameMessage};
