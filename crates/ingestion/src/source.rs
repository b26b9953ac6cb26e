//! 帧数据源 trait 与发送端

use std::sync::Arc;

use async_channel::{Sender, TrySendError};
use contracts::SensorFrameMessage;
use metrics::counter;
use tracing::{trace, warn};

use crate::config::IngestionMetrics;
use crate::error::Result;

/// 帧数据源 trait
///
/// Mock 与 Replay 数据源都实现此 trait，由 [`Subscriber`](crate::Subscriber) 统一管理。
/// `start` 在当前 tokio runtime 上启动后台任务。
pub trait FrameSource: Send + Sync {
    /// 数据源 ID
    fn source_id(&self) -> &str;

    /// 启动数据源，帧通过 `tx` 送入订阅队列
    fn start(&self, tx: FrameSender) -> Result<()>;

    /// 停止数据源
    fn stop(&self);

    /// 是否正在运行
    fn is_running(&self) -> bool;
}

/// 投递结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// 队列已满，丢弃最新帧
    Dropped,
    /// 接收端已关闭
    Closed,
}

/// 订阅队列的发送端
///
/// 非阻塞投递：队列满时丢弃当前帧并计数。
#[derive(Debug, Clone)]
pub struct FrameSender {
    channel: String,
    tx: Sender<SensorFrameMessage>,
    metrics: Arc<IngestionMetrics>,
}

impl FrameSender {
    pub(crate) fn new(
        channel: String,
        tx: Sender<SensorFrameMessage>,
        metrics: Arc<IngestionMetrics>,
    ) -> Self {
        Self {
            channel,
            tx,
            metrics,
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// 投递一帧
    pub fn send(&self, msg: SensorFrameMessage) -> Delivery {
        match self.tx.try_send(msg) {
            Ok(()) => {
                self.metrics.record_received();
                self.metrics.update_queue_len(self.tx.len());
                trace!(channel = %self.channel, queue_len = self.tx.len(), "frame queued");
                Delivery::Queued
            }
            Err(TrySendError::Full(msg)) => {
                self.metrics.record_dropped();
                counter!("prefuse_proxy_inbound_dropped_total", "channel" => self.channel.clone())
                    .increment(1);
                warn!(
                    channel = %self.channel,
                    sensor_id = %msg.sensor_id,
                    timestamp = msg.timestamp,
                    "inbound queue full, frame dropped"
                );
                Delivery::Dropped
            }
            Err(TrySendError::Closed(_)) => Delivery::Closed,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
