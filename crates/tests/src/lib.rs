//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试（线上 JSON 形状）
//! - 端到端测试：输入通道 → 组件 → 输出通道 → sinks
//! - 配置加载与组件初始化

#[cfg(test)]
mod contract_tests {
    use contracts::{ObstacleSubType, ObstacleType, PrefusedObstacle, PrefusedObstacles};

    #[test]
    fn test_record_wire_shape() {
        let mut record = PrefusedObstacles {
            sensor_name: "lidar128".to_string(),
            ..Default::default()
        };
        record.header.timestamp_sec = 10.0;
        record.header.sequence_num = 7;
        record.obstacles.push(PrefusedObstacle {
            theta: 0.5,
            hull: Default::default(),
            obstacle_type: ObstacleType::Vehicle,
            sub_type: ObstacleSubType::from_code(42),
        });

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["header"]["sequence_num"], 7);
        assert_eq!(value["sensor_name"], "lidar128");
        assert_eq!(value["obstacles"][0]["type"], 5);
        assert_eq!(value["obstacles"][0]["sub_type"], 42);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use contracts::{
        Component, ComponentConfig, DetectedObject, Node, ObstacleSubType, ObstacleType, Point3D,
        SensorFrame, SensorFrameMessage, SensorInfo, SinkConfig, SinkType,
    };
    use dispatcher::{create_dispatcher, CaptureSink, ChannelNode, Dispatcher, SinkHandle};
    use ingestion::{MockFrameConfig, MockFrameSource, Subscriber};
    use observability::TranscodeStatsAggregator;
    use transcoder::{PrefuseProxyComponent, TranscoderError};

    fn object(polygon: Vec<Point3D>, theta: f64, object_type: i32, sub_type: i32) -> DetectedObject {
        DetectedObject {
            theta,
            polygon,
            object_type,
            sub_type,
        }
    }

    fn frame(timestamp: f64, objects: Vec<DetectedObject>) -> SensorFrameMessage {
        SensorFrameMessage::new(
            "lidar128",
            timestamp,
            SensorFrame {
                sensor_info: SensorInfo {
                    name: "velodyne128_fused".to_string(),
                },
                timestamp,
                objects,
            },
        )
    }

    /// Three frames through `proc`: populated, absent, empty polygons
    #[tokio::test]
    async fn test_e2e_three_frame_scenario() {
        let config = ComponentConfig::default();
        let mut node = ChannelNode::new(&config.name);
        let rx = node
            .advertise(&config.output_channel, config.channel_capacity)
            .unwrap();

        let (sink, capture) = CaptureSink::new("capture");
        let dispatcher =
            Dispatcher::with_handles(&config.output_channel, vec![SinkHandle::spawn(sink, 10)], rx)
                .spawn();

        let mut component = PrefuseProxyComponent::init(&node, &config).unwrap();

        let messages = [
            frame(
                10.0,
                vec![object(
                    vec![Point3D::new(1.0, 2.0, 0.0), Point3D::new(3.0, 4.0, 0.0)],
                    0.5,
                    1,
                    2,
                )],
            ),
            SensorFrameMessage::empty("lidar128", 10.1),
            frame(
                10.2,
                vec![object(Vec::new(), 0.0, 3, 3), object(Vec::new(), 1.0, 5, 6)],
            ),
        ];
        for msg in &messages {
            assert!(component.proc(msg));
        }
        assert_eq!(component.sequence_num(), 3);
        assert_eq!(component.publish_failures(), 0);

        drop(component);
        drop(node);
        let metrics = tokio::time::timeout(Duration::from_secs(2), dispatcher)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(metrics[0].1.write_count, 3);

        let records = capture.records();
        assert_eq!(records.len(), 3);

        let seqs: Vec<u32> = records.iter().map(|r| r.header.sequence_num).collect();
        assert_eq!(seqs, vec![0, 1, 2]);

        let first = &records[0];
        assert_eq!(first.header.timestamp_sec, 10.0);
        assert_eq!(first.sensor_name, "lidar128");
        assert_eq!(first.obstacles.len(), 1);
        assert_eq!(first.obstacles[0].theta, 0.5);
        assert_eq!(
            first.obstacles[0].hull.points,
            vec![Point3D::new(1.0, 2.0, 0.0), Point3D::new(3.0, 4.0, 0.0)]
        );
        assert_eq!(first.obstacles[0].obstacle_type, ObstacleType::UnknownMovable);
        assert_eq!(first.obstacles[0].sub_type, ObstacleSubType::UnknownUnmovable);

        let second = &records[1];
        assert_eq!(second.header.timestamp_sec, 10.1);
        assert!(second.obstacles.is_empty());

        let third = &records[2];
        assert_eq!(third.header.timestamp_sec, 10.2);
        assert_eq!(third.obstacles.len(), 2);
        assert!(third.obstacles.iter().all(|o| o.hull.points.is_empty()));
        assert_eq!(third.obstacles[1].obstacle_type, ObstacleType::Vehicle);
    }

    /// Mock source → subscriber → component → dispatcher
    #[tokio::test]
    async fn test_e2e_mock_source_pipeline() {
        let config = ComponentConfig::default();
        let mut node = ChannelNode::new(&config.name);
        let rx = node
            .advertise(&config.output_channel, config.channel_capacity)
            .unwrap();

        let (sink, capture) = CaptureSink::new("capture");
        let dispatcher =
            Dispatcher::with_handles(&config.output_channel, vec![SinkHandle::spawn(sink, 50)], rx)
                .spawn();
        let mut component = PrefuseProxyComponent::init(&node, &config).unwrap();

        let mut subscriber = Subscriber::new(&config.input_channel, 50);
        subscriber
            .register_source(Box::new(MockFrameSource::new(MockFrameConfig {
                frequency_hz: 200.0,
                empty_ratio: 0.3,
                seed: Some(5),
                max_frames: Some(20),
                ..Default::default()
            })))
            .unwrap();
        let frames = subscriber.take_receiver().unwrap();
        subscriber.start_all().unwrap();

        let mut stats = TranscodeStatsAggregator::new();
        let consume = async {
            while let Ok(msg) = frames.recv().await {
                let record = component.publish(&msg);
                stats.update(&record, msg.frame.is_some());
            }
        };
        tokio::time::timeout(Duration::from_secs(5), consume)
            .await
            .unwrap();

        assert_eq!(stats.total_records, 20);
        assert_eq!(stats.sequence_gaps, 0);
        assert_eq!(subscriber.metrics().snapshot().frames_dropped, 0);

        drop(component);
        drop(node);
        tokio::time::timeout(Duration::from_secs(2), dispatcher)
            .await
            .unwrap()
            .unwrap();

        let records = capture.records();
        let seqs: Vec<u32> = records.iter().map(|r| r.header.sequence_num).collect();
        assert_eq!(seqs, (0..20).collect::<Vec<u32>>());
        assert!(records.windows(2).all(|w| {
            w[0].header.timestamp_sec < w[1].header.timestamp_sec
        }));
    }

    /// Records keep flowing while a full output channel rejects writes
    #[tokio::test]
    async fn test_full_output_channel_counts_failures() {
        let config = ComponentConfig {
            channel_capacity: 2,
            ..Default::default()
        };
        let mut node = ChannelNode::new(&config.name);
        let _rx = node
            .advertise(&config.output_channel, config.channel_capacity)
            .unwrap();
        let mut component = PrefuseProxyComponent::init(&node, &config).unwrap();

        for i in 0..5 {
            assert!(component.proc(&SensorFrameMessage::empty("lidar128", i as f64)));
        }
        assert_eq!(component.publish_failures(), 3);
        assert_eq!(component.sequence_num(), 5);
    }

    #[test]
    fn test_init_fails_on_unadvertised_channel() {
        let node = ChannelNode::new("prefuse_proxy");
        assert!(node.create_writer("/apollo/prefuse").is_err());

        let result = PrefuseProxyComponent::init(&node, &ComponentConfig::default());
        assert!(matches!(result, Err(TranscoderError::WriterCreation { .. })));
    }

    #[tokio::test]
    async fn test_dispatcher_multiple_sinks_from_config() {
        let mut node = ChannelNode::new("prefuse_proxy");
        let rx = node.advertise("/apollo/prefuse", 10).unwrap();

        let sink_configs = vec![
            SinkConfig {
                name: "log1".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 50,
                params: HashMap::new(),
            },
            SinkConfig {
                name: "log2".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 50,
                params: HashMap::new(),
            },
        ];
        let dispatcher = create_dispatcher("/apollo/prefuse", sink_configs, rx)
            .await
            .unwrap();
        assert_eq!(dispatcher.metrics().len(), 2);
        let handle = dispatcher.spawn();

        let mut component =
            PrefuseProxyComponent::init(&node, &ComponentConfig::default()).unwrap();
        for i in 0..5 {
            let record = component.publish(&SensorFrameMessage::empty("lidar128", i as f64));
            assert_eq!(record.header.sequence_num, i);
        }
        assert_eq!(component.sequence_num(), 5);

        drop(component);
        drop(node);
        let metrics = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        for (_, snapshot) in metrics {
            assert_eq!(snapshot.write_count, 5);
            assert_eq!(snapshot.last_sequence_num, Some(4));
        }
    }
}

#[cfg(test)]
mod config_tests {
    use config_loader::ConfigLoader;
    use contracts::{ProxyBlueprint, SinkType, SourceKind};

    #[test]
    fn test_toml_round_trip_keeps_defaults() {
        let blueprint = ProxyBlueprint::with_defaults();
        let toml = ConfigLoader::to_toml(&blueprint).unwrap();
        let loaded = ConfigLoader::load_from_str(&toml, config_loader::ConfigFormat::Toml).unwrap();

        assert_eq!(loaded.component.input_channel, "/perception/inner/PrefuseFrame");
        assert_eq!(loaded.component.output_channel, "/apollo/prefuse");
        assert_eq!(loaded.sinks.len(), 1);
        assert_eq!(loaded.sinks[0].sink_type, SinkType::Log);
    }

    #[test]
    fn test_replay_config_file() {
        let toml = r#"
            [component]
            name = "prefuse_proxy"

            [source]
            kind = "replay"
            replay_path = "recordings/frames.jsonl"
            speed_multiplier = 2.0

            [[sinks]]
            name = "out"
            sink_type = "file"
            [sinks.params]
            base_path = "./output"
        "#;
        let blueprint =
            ConfigLoader::load_from_str(toml, config_loader::ConfigFormat::Toml).unwrap();
        assert_eq!(blueprint.source.kind, SourceKind::Replay);
        assert_eq!(blueprint.source.speed_multiplier, 2.0);
        assert_eq!(blueprint.sinks[0].sink_type, SinkType::File);
    }

    #[test]
    fn test_load_rejects_same_channels() {
        let toml = r#"
            [component]
            input_channel = "/apollo/prefuse"
            output_channel = "/apollo/prefuse"
        "#;
        assert!(ConfigLoader::load_from_str(toml, config_loader::ConfigFormat::Toml).is_err());
    }
}
