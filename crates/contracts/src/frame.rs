//! SensorFrameMessage - inbound message from sensor fusion
//!
//! Read-only to the proxy: every field is copied, none is mutated.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Inbound per-sensor message
///
/// `frame` is `None` for sensor ticks that carry no detection result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorFrameMessage {
    /// Originating sensor identifier
    pub sensor_id: String,

    /// Capture time (seconds)
    pub timestamp: f64,

    /// Detection result, shared with other subscribers of the same message
    #[serde(default)]
    pub frame: Option<Arc<SensorFrame>>,
}

impl SensorFrameMessage {
    /// Message with a detection result
    pub fn new(sensor_id: impl Into<String>, timestamp: f64, frame: SensorFrame) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            timestamp,
            frame: Some(Arc::new(frame)),
        }
    }

    /// Message without a detection result
    pub fn empty(sensor_id: impl Into<String>, timestamp: f64) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            timestamp,
            frame: None,
        }
    }

    /// Number of detected objects (0 when the frame is absent)
    pub fn object_count(&self) -> usize {
        self.frame.as_ref().map_or(0, |frame| frame.objects.len())
    }
}

/// Detection result for one sensor tick
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorFrame {
    /// Sensor description
    #[serde(default)]
    pub sensor_info: SensorInfo,

    /// Detection timestamp (seconds)
    #[serde(default)]
    pub timestamp: f64,

    /// Detected objects, in detector order
    #[serde(default)]
    pub objects: Vec<DetectedObject>,
}

/// Sensor description attached to a frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorInfo {
    pub name: String,
}

/// One detected object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    /// Orientation (rad)
    pub theta: f64,

    /// Footprint polygon, may be empty
    #[serde(default)]
    pub polygon: Vec<Point3D>,

    /// Classification code
    #[serde(rename = "type", default)]
    pub object_type: i32,

    /// Sub-classification code
    #[serde(default)]
    pub sub_type: i32,
}

/// 3D point (meters)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<(f64, f64, f64)> for Point3D {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self { x, y, z }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_count() {
        let frame = SensorFrame {
            objects: vec![DetectedObject::default(), DetectedObject::default()],
            ..Default::default()
        };
        assert_eq!(SensorFrameMessage::new("lidar", 1.0, frame).object_count(), 2);
        assert_eq!(SensorFrameMessage::empty("lidar", 1.0).object_count(), 0);
    }

    #[test]
    fn test_deserialize_type_field() {
        let json = r#"{
            "sensor_id": "lidar128",
            "timestamp": 10.0,
            "frame": {
                "sensor_info": { "name": "velodyne128" },
                "objects": [
                    { "theta": 0.5, "polygon": [{"x": 1.0, "y": 2.0, "z": 0.0}], "type": 1, "sub_type": 2 }
                ]
            }
        }"#;
        let msg: SensorFrameMessage = serde_json::from_str(json).unwrap();
        let frame = msg.frame.unwrap();
        assert_eq!(frame.sensor_info.name, "velodyne128");
        assert_eq!(frame.objects[0].object_type, 1);
        assert_eq!(frame.objects[0].sub_type, 2);
        assert_eq!(frame.objects[0].polygon[0], Point3D::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn test_deserialize_missing_frame() {
        let msg: SensorFrameMessage =
            serde_json::from_str(r#"{"sensor_id": "radar_front", "timestamp": 3.25}"#).unwrap();
        assert!(msg.frame.is_none());
    }
}
