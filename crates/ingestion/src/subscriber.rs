//! Subscriber - 输入通道的订阅端
//!
//! 管理一个有界队列以及向其投递帧的数据源。

use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender};
use contracts::SensorFrameMessage;
use tracing::{debug, info, instrument};

use crate::config::IngestionMetrics;
use crate::error::{IngestionError, Result};
use crate::source::{FrameSender, FrameSource};

/// 订阅队列接收端
pub type FrameReceiver = Receiver<SensorFrameMessage>;

/// 单通道订阅者
///
/// 所有数据源共享同一个队列，帧按到达顺序交付。
/// `start_all` 之后 Subscriber 不再持有发送端：全部数据源结束时接收端关闭。
pub struct Subscriber {
    channel: String,

    /// 已注册数据源
    sources: Vec<Box<dyn FrameSource>>,

    /// 共享指标
    metrics: Arc<IngestionMetrics>,

    /// 发送端，启动后释放
    tx: Option<Sender<SensorFrameMessage>>,

    /// 接收端，只能取走一次
    rx: Option<FrameReceiver>,
}

impl Subscriber {
    /// 创建订阅者
    ///
    /// # Arguments
    /// * `channel` - 订阅的通道名
    /// * `capacity` - 队列容量（最小为 1）
    pub fn new(channel: impl Into<String>, capacity: usize) -> Self {
        let (tx, rx) = bounded(capacity.max(1));
        Self {
            channel: channel.into(),
            sources: Vec::new(),
            metrics: Arc::new(IngestionMetrics::new()),
            tx: Some(tx),
            rx: Some(rx),
        }
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// 注册数据源
    #[instrument(
        name = "subscriber_register_source",
        skip(self, source),
        fields(channel = %self.channel, source_id = %source.source_id())
    )]
    pub fn register_source(&mut self, source: Box<dyn FrameSource>) -> Result<()> {
        if self.tx.is_none() {
            return Err(IngestionError::AlreadyStarted {
                channel: self.channel.clone(),
            });
        }
        debug!(source_id = %source.source_id(), "registered frame source");
        self.sources.push(source);
        Ok(())
    }

    /// 直接获取一个发送端（用于外部投递）
    pub fn sender(&self) -> Result<FrameSender> {
        let tx = self.tx.as_ref().ok_or_else(|| IngestionError::AlreadyStarted {
            channel: self.channel.clone(),
        })?;
        Ok(FrameSender::new(
            self.channel.clone(),
            tx.clone(),
            Arc::clone(&self.metrics),
        ))
    }

    /// 启动全部数据源并释放自身的发送端
    #[instrument(name = "subscriber_start_all", skip(self), fields(channel = %self.channel))]
    pub fn start_all(&mut self) -> Result<()> {
        info!(count = self.sources.len(), "starting frame sources");
        for source in &self.sources {
            if !source.is_running() {
                source.start(self.sender()?)?;
            }
        }
        self.tx = None;
        Ok(())
    }

    /// 停止全部数据源
    #[instrument(name = "subscriber_stop_all", skip(self), fields(channel = %self.channel))]
    pub fn stop_all(&self) {
        for source in &self.sources {
            if source.is_running() {
                debug!(source_id = %source.source_id(), "stopping frame source");
                source.stop();
            }
        }
    }

    /// 获取接收端
    ///
    /// 只能调用一次，之后返回 None
    pub fn take_receiver(&mut self) -> Option<FrameReceiver> {
        self.rx.take()
    }

    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// 是否仍有数据源在运行
    pub fn any_running(&self) -> bool {
        self.sources.iter().any(|s| s.is_running())
    }
}

impl Drop for Subscriber {
    fn drop(&mut self) {
        self.stop_all();
    }
}
