//! 转码指标收集模块
//!
//! 基于每条发布记录收集和统计 prefuse proxy 的运行指标。

use std::collections::HashMap;

use contracts::PrefusedObstacles;
use metrics::{counter, gauge, histogram};

/// 记录输入帧接收
pub fn record_frame_received(sensor_id: &str) {
    counter!(
        "prefuse_proxy_frames_received_total",
        "sensor_id" => sensor_id.to_string()
    )
    .increment(1);
}

/// 记录空帧 (无检测结果)
pub fn record_empty_frame(sensor_id: &str) {
    counter!(
        "prefuse_proxy_empty_frames_total",
        "sensor_id" => sensor_id.to_string()
    )
    .increment(1);
}

/// 记录一次转码结果
///
/// 序列号写入 gauge，下游可据此检测跳号。
pub fn record_frame_transcoded(sequence_num: u32, obstacle_count: usize) {
    counter!("prefuse_proxy_records_total").increment(1);
    gauge!("prefuse_proxy_last_sequence_num").set(sequence_num as f64);
    histogram!("prefuse_proxy_obstacles_per_frame").record(obstacle_count as f64);
}

/// 记录发布失败 (通道满/已关闭)
pub fn record_publish_failure(channel: &str) {
    counter!(
        "prefuse_proxy_publish_failures_total",
        "channel" => channel.to_string()
    )
    .increment(1);
}

/// 记录 sink 分发结果
pub fn record_record_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "prefuse_proxy_records_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 记录通道队列深度
pub fn record_queue_depth(channel: &str, depth: usize) {
    gauge!(
        "prefuse_proxy_queue_depth",
        "channel" => channel.to_string()
    )
    .set(depth as f64);
}

/// 转码指标聚合器
///
/// 在内存中聚合指标，便于运行结束时输出摘要。
#[derive(Debug, Clone, Default)]
pub struct TranscodeStatsAggregator {
    /// 总记录数
    pub total_records: u64,

    /// 空帧数
    pub empty_frames: u64,

    /// 障碍物总数
    pub total_obstacles: u64,

    /// 未知类别码数 (type 或 sub_type 不在枚举内)
    pub unrecognized_codes: u64,

    /// 检测到的序列号跳变次数
    pub sequence_gaps: u64,

    /// 每帧障碍物数统计
    pub obstacle_stats: RunningStats,

    /// 每个 hull 点数统计
    pub hull_point_stats: RunningStats,

    /// 各传感器记录数
    pub sensor_counts: HashMap<String, u64>,

    last_sequence_num: Option<u32>,
}

impl TranscodeStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    ///
    /// `frame_present` 区分空帧与零目标帧。
    pub fn update(&mut self, record: &PrefusedObstacles, frame_present: bool) {
        self.total_records += 1;
        if !frame_present {
            self.empty_frames += 1;
        }

        let seq = record.header.sequence_num;
        if let Some(last) = self.last_sequence_num {
            if seq != last.wrapping_add(1) {
                self.sequence_gaps += 1;
            }
        }
        self.last_sequence_num = Some(seq);

        *self
            .sensor_counts
            .entry(record.sensor_name.clone())
            .or_insert(0) += 1;

        self.total_obstacles += record.obstacles.len() as u64;
        self.obstacle_stats.push(record.obstacles.len() as f64);

        for obstacle in &record.obstacles {
            self.hull_point_stats.push(obstacle.hull.points.len() as f64);
            if !obstacle.obstacle_type.is_known() || !obstacle.sub_type.is_known() {
                self.unrecognized_codes += 1;
            }
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_records: self.total_records,
            empty_frames: self.empty_frames,
            total_obstacles: self.total_obstacles,
            unrecognized_codes: self.unrecognized_codes,
            sequence_gaps: self.sequence_gaps,
            empty_rate: if self.total_records > 0 {
                self.empty_frames as f64 / self.total_records as f64 * 100.0
            } else {
                0.0
            },
            obstacles_per_frame: StatsSummary::from(&self.obstacle_stats),
            hull_points: StatsSummary::from(&self.hull_point_stats),
            sensor_counts: self.sensor_counts.clone(),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 指标摘要
#[derive(Debug, Clone, Default)]
pub struct MetricsSummary {
    pub total_records: u64,
    pub empty_frames: u64,
    pub total_obstacles: u64,
    pub unrecognized_codes: u64,
    pub sequence_gaps: u64,
    pub empty_rate: f64,
    pub obstacles_per_frame: StatsSummary,
    pub hull_points: StatsSummary,
    pub sensor_counts: HashMap<String, u64>,
}

impl std::fmt::Display for MetricsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Prefuse Proxy Summary ===")?;
        writeln!(f, "Records published: {}", self.total_records)?;
        writeln!(
            f,
            "Empty frames: {} ({:.2}%)",
            self.empty_frames, self.empty_rate
        )?;
        writeln!(f, "Obstacles: {}", self.total_obstacles)?;
        writeln!(f, "Unrecognized class codes: {}", self.unrecognized_codes)?;
        writeln!(f, "Sequence gaps: {}", self.sequence_gaps)?;
        writeln!(f, "Obstacles per frame: {}", self.obstacles_per_frame)?;
        writeln!(f, "Hull points: {}", self.hull_points)?;

        if !self.sensor_counts.is_empty() {
            writeln!(f, "Records per sensor:")?;
            for (sensor, count) in &self.sensor_counts {
                writeln!(f, "  {}: {}", sensor, count)?;
            }
        }

        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.2}, std={:.2} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        Header, Hull, ObstacleSubType, ObstacleType, Point3D, PrefusedObstacle,
    };

    fn record(seq: u32, sensor: &str, hulls: &[usize]) -> PrefusedObstacles {
        PrefusedObstacles {
            header: Header {
                timestamp_sec: seq as f64 * 0.1,
                sequence_num: seq,
            },
            sensor_name: sensor.to_string(),
            obstacles: hulls
                .iter()
                .map(|&n| PrefusedObstacle {
                    theta: 0.0,
                    hull: Hull {
                        points: vec![Point3D::default(); n],
                    },
                    obstacle_type: ObstacleType::Vehicle,
                    sub_type: ObstacleSubType::Car,
                })
                .collect(),
        }
    }

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 8);
        assert!((stats.mean() - 5.0).abs() < 1e-10);
        assert!((stats.min() - 2.0).abs() < 1e-10);
        assert!((stats.max() - 9.0).abs() < 1e-10);
        assert!((stats.variance() - 32.0 / 7.0).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_update() {
        let mut aggregator = TranscodeStatsAggregator::new();

        aggregator.update(&record(0, "lidar128", &[2, 4]), true);
        aggregator.update(&record(1, "lidar128", &[]), false);
        aggregator.update(&record(2, "radar", &[3]), true);

        assert_eq!(aggregator.total_records, 3);
        assert_eq!(aggregator.empty_frames, 1);
        assert_eq!(aggregator.total_obstacles, 3);
        assert_eq!(aggregator.sequence_gaps, 0);
        assert_eq!(aggregator.hull_point_stats.count(), 3);
        assert_eq!(aggregator.sensor_counts.get("lidar128"), Some(&2));
    }

    #[test]
    fn test_aggregator_counts_gaps_and_unknown_codes() {
        let mut aggregator = TranscodeStatsAggregator::new();
        let mut odd = record(5, "lidar", &[1]);
        odd.obstacles[0].obstacle_type = ObstacleType::Unrecognized(77);

        aggregator.update(&record(0, "lidar", &[]), true);
        aggregator.update(&odd, true);

        assert_eq!(aggregator.sequence_gaps, 1);
        assert_eq!(aggregator.unrecognized_codes, 1);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = TranscodeStatsAggregator::new();
        aggregator.update(&record(0, "lidar", &[1]), true);
        aggregator.update(&record(1, "lidar", &[]), false);

        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Records published: 2"));
        assert!(output.contains("50.00%"));
    }
}
