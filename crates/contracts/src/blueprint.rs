//! ProxyBlueprint - Config Loader 输出
//!
//! 描述完整的运行配置：组件通道、输入帧源、输出路由。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use validator::Validate;

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的运行配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProxyBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 组件设置
    #[serde(default)]
    #[validate(nested)]
    pub component: ComponentConfig,

    /// 输入帧源
    #[serde(default)]
    #[validate(nested)]
    pub source: SourceConfig,

    /// 输出路由配置
    #[serde(default)]
    #[validate(nested)]
    pub sinks: Vec<SinkConfig>,
}

/// 组件配置：名称与输入/输出通道
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ComponentConfig {
    /// 组件名称 (日志用)
    #[serde(default = "default_component_name")]
    #[validate(length(min = 1))]
    pub name: String,

    /// 订阅通道
    #[serde(default = "default_input_channel")]
    #[validate(length(min = 1))]
    pub input_channel: String,

    /// 发布通道
    #[serde(default = "default_output_channel")]
    #[validate(length(min = 1))]
    pub output_channel: String,

    /// 通道队列容量
    #[serde(default = "default_channel_capacity")]
    #[validate(range(min = 1))]
    pub channel_capacity: usize,
}

impl Default for ComponentConfig {
    fn default() -> Self {
        Self {
            name: default_component_name(),
            input_channel: default_input_channel(),
            output_channel: default_output_channel(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_component_name() -> String {
    "prefuse_proxy".to_string()
}

fn default_input_channel() -> String {
    "/perception/inner/PrefuseFrame".to_string()
}

fn default_output_channel() -> String {
    "/apollo/prefuse".to_string()
}

fn default_channel_capacity() -> usize {
    100
}

/// 输入帧源配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SourceConfig {
    /// 帧源类型
    #[serde(default)]
    pub kind: SourceKind,

    /// 传感器 ID (mock 源写入每帧的 sensor_id)
    #[serde(default = "default_sensor_id")]
    #[validate(length(min = 1))]
    pub sensor_id: String,

    /// 发送频率 (Hz)，范围 (0, 1000]
    #[serde(default = "default_frequency")]
    #[validate(range(exclusive_min = 0.0, max = 1000.0))]
    pub frequency_hz: f64,

    /// 每帧最大目标数
    #[serde(default = "default_max_objects")]
    pub max_objects: usize,

    /// 每个目标多边形最大点数
    #[serde(default = "default_max_polygon_points")]
    pub max_polygon_points: usize,

    /// 空帧比例 [0, 1]
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub empty_ratio: f64,

    /// 随机种子 (None = 随机)
    #[serde(default)]
    pub seed: Option<u64>,

    /// 回放文件路径 (仅 replay)
    #[serde(default)]
    pub replay_path: Option<PathBuf>,

    /// 回放速度倍率 (1.0 = 原速)
    #[serde(default = "default_speed_multiplier")]
    #[validate(range(exclusive_min = 0.0))]
    pub speed_multiplier: f64,

    /// 是否循环回放
    #[serde(default)]
    pub loop_playback: bool,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            sensor_id: default_sensor_id(),
            frequency_hz: default_frequency(),
            max_objects: default_max_objects(),
            max_polygon_points: default_max_polygon_points(),
            empty_ratio: 0.0,
            seed: None,
            replay_path: None,
            speed_multiplier: default_speed_multiplier(),
            loop_playback: false,
        }
    }
}

fn default_sensor_id() -> String {
    "lidar128".to_string()
}

fn default_frequency() -> f64 {
    10.0
}

fn default_max_objects() -> usize {
    8
}

fn default_max_polygon_points() -> usize {
    6
}

fn default_speed_multiplier() -> f64 {
    1.0
}

/// 帧源类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// 合成数据
    #[default]
    Mock,
    /// 录制文件回放
    Replay,
}

/// Sink 输出配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SinkConfig {
    /// Sink 名称
    #[validate(length(min = 1))]
    pub name: String,

    /// Sink 类型
    pub sink_type: SinkType,

    /// 队列容量
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1))]
    pub queue_capacity: usize,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// 日志输出
    Log,
    /// 文件输出 (JSONL)
    File,
    /// 网络输出 (UDP)
    Network,
}

impl ProxyBlueprint {
    /// 最小可用配置：mock 源 + log sink
    pub fn with_defaults() -> Self {
        Self {
            version: ConfigVersion::V1,
            component: ComponentConfig::default(),
            source: SourceConfig::default(),
            sinks: vec![SinkConfig {
                name: "log".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: default_queue_capacity(),
                params: HashMap::new(),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_defaults() {
        let component = ComponentConfig::default();
        assert_eq!(component.output_channel, "/apollo/prefuse");
        assert_eq!(component.channel_capacity, 100);
    }

    #[test]
    fn field_rules_reject_zero_frequency() {
        let mut blueprint = ProxyBlueprint::with_defaults();
        assert!(blueprint.validate().is_ok());

        blueprint.source.frequency_hz = 0.0;
        assert!(blueprint.validate().is_err());
    }

    #[test]
    fn field_rules_reject_unbounded_frequency() {
        let mut blueprint = ProxyBlueprint::with_defaults();
        for frequency_hz in [5e9, f64::INFINITY] {
            blueprint.source.frequency_hz = frequency_hz;
            assert!(blueprint.validate().is_err(), "accepted {frequency_hz}");
        }
        blueprint.source.frequency_hz = 1000.0;
        assert!(blueprint.validate().is_ok());
    }

    #[test]
    fn field_rules_reject_empty_sink_name() {
        let mut blueprint = ProxyBlueprint::with_defaults();
        blueprint.sinks[0].name.clear();
        assert!(blueprint.validate().is_err());
    }
}
