//! Mock 帧数据源
//!
//! 无感知融合环境时生成合成的检测结果。

use std::f64::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use contracts::{DetectedObject, Point3D, SensorFrame, SensorFrameMessage, SensorInfo, SourceConfig};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, trace};

use crate::error::{IngestionError, Result};
use crate::source::{Delivery, FrameSender, FrameSource};

/// Largest ObstacleType code
const MAX_TYPE_CODE: i32 = 5;
/// Largest ObstacleSubType code
const MAX_SUB_TYPE_CODE: i32 = 11;
/// Half extent of the generated area around the sensor (m)
const AREA_HALF_EXTENT: f64 = 60.0;
/// Max radius of a generated footprint (m)
const MAX_FOOTPRINT_RADIUS: f64 = 3.0;
/// Tick period bounds; `tokio::time::interval` panics on a zero period
const MIN_TICK: Duration = Duration::from_nanos(1);
const MAX_TICK: Duration = Duration::from_secs(24 * 60 * 60);

/// Interval between frames for `frequency_hz`
///
/// Out-of-range or non-finite frequencies are clamped, never panic.
fn tick_period(frequency_hz: f64) -> Duration {
    Duration::try_from_secs_f64(1.0 / frequency_hz)
        .unwrap_or(MAX_TICK)
        .clamp(MIN_TICK, MAX_TICK)
}

/// Mock 帧源配置
#[derive(Debug, Clone)]
pub struct MockFrameConfig {
    /// 写入每帧的传感器 ID
    pub sensor_id: String,

    /// 发送频率 (Hz)
    pub frequency_hz: f64,

    /// 每帧最大目标数
    pub max_objects: usize,

    /// 每个多边形最大点数
    pub max_polygon_points: usize,

    /// 无检测结果帧的比例
    pub empty_ratio: f64,

    /// 随机种子
    pub seed: Option<u64>,

    /// 发送帧数上限 (None = 不限)
    pub max_frames: Option<u64>,
}

impl Default for MockFrameConfig {
    fn default() -> Self {
        Self {
            sensor_id: "lidar128".to_string(),
            frequency_hz: 10.0,
            max_objects: 8,
            max_polygon_points: 6,
            empty_ratio: 0.0,
            seed: None,
            max_frames: None,
        }
    }
}

impl From<&SourceConfig> for MockFrameConfig {
    fn from(config: &SourceConfig) -> Self {
        Self {
            sensor_id: config.sensor_id.clone(),
            frequency_hz: config.frequency_hz,
            max_objects: config.max_objects,
            max_polygon_points: config.max_polygon_points,
            empty_ratio: config.empty_ratio,
            seed: config.seed,
            max_frames: None,
        }
    }
}

/// 合成帧生成器
///
/// 与调度分离，便于在同步代码中复现同一序列。
pub struct FrameGenerator {
    config: MockFrameConfig,
    rng: StdRng,
    base_timestamp: f64,
    index: u64,
}

impl FrameGenerator {
    pub fn new(config: MockFrameConfig, base_timestamp: f64) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            config,
            rng,
            base_timestamp,
            index: 0,
        }
    }

    /// 已生成帧数
    pub fn generated(&self) -> u64 {
        self.index
    }

    /// 生成下一帧
    pub fn next_frame(&mut self) -> SensorFrameMessage {
        let timestamp = self.base_timestamp + self.index as f64 / self.config.frequency_hz;
        self.index += 1;

        let empty_ratio = self.config.empty_ratio.clamp(0.0, 1.0);
        if self.rng.random_bool(empty_ratio) {
            return SensorFrameMessage::empty(self.config.sensor_id.clone(), timestamp);
        }

        let count = self.rng.random_range(0..=self.config.max_objects);
        let objects = (0..count).map(|_| self.random_object()).collect();

        let frame = SensorFrame {
            sensor_info: SensorInfo {
                name: self.config.sensor_id.clone(),
            },
            timestamp,
            objects,
        };
        SensorFrameMessage::new(self.config.sensor_id.clone(), timestamp, frame)
    }

    fn random_object(&mut self) -> DetectedObject {
        let cx = self.rng.random_range(-AREA_HALF_EXTENT..AREA_HALF_EXTENT);
        let cy = self.rng.random_range(-AREA_HALF_EXTENT..AREA_HALF_EXTENT);
        let radius = self.rng.random_range(0.3..MAX_FOOTPRINT_RADIUS);

        let points = self.rng.random_range(0..=self.config.max_polygon_points);
        let polygon = (0..points)
            .map(|i| {
                let angle = 2.0 * PI * i as f64 / points as f64;
                Point3D::new(cx + radius * angle.cos(), cy + radius * angle.sin(), 0.0)
            })
            .collect();

        DetectedObject {
            theta: self.rng.random_range(-PI..PI),
            polygon,
            object_type: self.rng.random_range(0..=MAX_TYPE_CODE),
            sub_type: self.rng.random_range(0..=MAX_SUB_TYPE_CODE),
        }
    }
}

/// Mock 帧数据源
pub struct MockFrameSource {
    config: MockFrameConfig,
    running: Arc<AtomicBool>,
}

impl MockFrameSource {
    pub fn new(config: MockFrameConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 以默认参数创建指定传感器、频率的源
    pub fn lidar(sensor_id: &str, frequency_hz: f64) -> Self {
        Self::new(MockFrameConfig {
            sensor_id: sensor_id.to_string(),
            frequency_hz,
            ..Default::default()
        })
    }

    pub fn config(&self) -> &MockFrameConfig {
        &self.config
    }
}

impl FrameSource for MockFrameSource {
    fn source_id(&self) -> &str {
        &self.config.sensor_id
    }

    fn start(&self, tx: FrameSender) -> Result<()> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(IngestionError::AlreadyRunning {
                source_id: self.config.sensor_id.clone(),
            });
        }

        let config = self.config.clone();
        let running = Arc::clone(&self.running);
        let base_timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(tick_period(config.frequency_hz));
            let mut generator = FrameGenerator::new(config.clone(), base_timestamp);

            info!(
                sensor_id = %config.sensor_id,
                frequency_hz = config.frequency_hz,
                channel = %tx.channel(),
                "mock frame source started"
            );

            while running.load(Ordering::Relaxed) {
                ticker.tick().await;
                if config
                    .max_frames
                    .is_some_and(|max| generator.generated() >= max)
                {
                    break;
                }

                let msg = generator.next_frame();
                let (timestamp, objects) = (msg.timestamp, msg.object_count());
                if tx.send(msg) == Delivery::Closed {
                    debug!(sensor_id = %config.sensor_id, "mock source channel closed");
                    break;
                }
                trace!(sensor_id = %config.sensor_id, timestamp, objects, "mock frame sent");
            }

            running.store(false, Ordering::SeqCst);
            debug!(
                sensor_id = %config.sensor_id,
                frames = generator.generated(),
                "mock frame source stopped"
            );
        });

        Ok(())
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}
