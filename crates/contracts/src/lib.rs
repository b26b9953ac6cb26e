//! # Contracts
//!
//! Frozen interface contracts (ICD) for the prefuse proxy.
//! All business crates depend only on this crate, reverse dependencies are prohibited.
//!
//! ## Message flow
//! - Inbound: [`SensorFrameMessage`] (sensor fusion output, read-only here)
//! - Outbound: [`PrefusedObstacles`] (one record per inbound message)
//!
//! ## Time Model
//! - Timestamps are capture time in seconds (f64), copied through untouched
//! - `sequence_num` is assigned by the proxy component, starting at 0

mod blueprint;
mod channel;
mod error;
mod frame;
mod obstacle;
mod sink;

pub use blueprint::*;
pub use channel::{Component, Node, ObstacleWriter};
pub use error::*;
pub use frame::*;
pub use obstacle::*;
pub use sink::*;
