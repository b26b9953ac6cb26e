//! PrefusedObstacles - outbound record
//!
//! One record is published per inbound [`SensorFrameMessage`](crate::SensorFrameMessage).

use serde::{Deserialize, Serialize};

use crate::Point3D;

/// Outbound record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrefusedObstacles {
    pub header: Header,

    /// Copied from the inbound `sensor_id`
    pub sensor_name: String,

    /// One entry per inbound object, same order
    #[serde(default)]
    pub obstacles: Vec<PrefusedObstacle>,
}

/// Record header
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Capture time copied from the inbound message (seconds)
    pub timestamp_sec: f64,

    /// Per-component sequence number, starts at 0
    pub sequence_num: u32,
}

/// Single obstacle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrefusedObstacle {
    pub theta: f64,
    pub hull: Hull,
    #[serde(rename = "type")]
    pub obstacle_type: ObstacleType,
    pub sub_type: ObstacleSubType,
}

/// Footprint hull
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hull {
    #[serde(default)]
    pub points: Vec<Point3D>,
}

/// Declares an open enumeration keyed by an `i32` wire code.
///
/// Codes without a named variant are kept in `Unrecognized` so the wire
/// value never changes on the way through.
macro_rules! define_coded_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident = $code:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "i32", into = "i32")]
        pub enum $name {
            $($variant,)+
            /// Code outside the known domain
            Unrecognized(i32),
        }

        impl $name {
            /// Build from a wire code
            pub fn from_code(code: i32) -> Self {
                match code {
                    $($code => Self::$variant,)+
                    other => Self::Unrecognized(other),
                }
            }

            /// Wire code
            pub fn code(self) -> i32 {
                match self {
                    $(Self::$variant => $code,)+
                    Self::Unrecognized(other) => other,
                }
            }

            /// Whether the code has a named variant
            pub fn is_known(self) -> bool {
                !matches!(self, Self::Unrecognized(_))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::from_code(0)
            }
        }

        impl From<i32> for $name {
            fn from(code: i32) -> Self {
                Self::from_code(code)
            }
        }

        impl From<$name> for i32 {
            fn from(value: $name) -> Self {
                value.code()
            }
        }
    };
}

define_coded_enum!(
    /// Obstacle class
    ObstacleType {
        Unknown = 0,
        UnknownMovable = 1,
        UnknownUnmovable = 2,
        Pedestrian = 3,
        Bicycle = 4,
        Vehicle = 5,
    }
);

define_coded_enum!(
    /// Obstacle sub-class
    ObstacleSubType {
        Unknown = 0,
        UnknownMovable = 1,
        UnknownUnmovable = 2,
        Car = 3,
        Van = 4,
        Truck = 5,
        Bus = 6,
        Cyclist = 7,
        Motorcyclist = 8,
        Tricyclist = 9,
        Pedestrian = 10,
        TrafficCone = 11,
    }
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes() {
        assert_eq!(ObstacleType::from_code(5), ObstacleType::Vehicle);
        assert_eq!(ObstacleSubType::from_code(11), ObstacleSubType::TrafficCone);
        assert_eq!(ObstacleType::Pedestrian.code(), 3);
        assert_eq!(ObstacleType::default(), ObstacleType::Unknown);
    }

    #[test]
    fn test_unrecognized_code_kept() {
        let t = ObstacleType::from_code(42);
        assert_eq!(t, ObstacleType::Unrecognized(42));
        assert!(!t.is_known());
        assert_eq!(t.code(), 42);

        let st = ObstacleSubType::from_code(-1);
        assert_eq!(st.code(), -1);
    }

    #[test]
    fn test_serialized_as_code() {
        let obstacle = PrefusedObstacle {
            theta: 0.25,
            hull: Hull::default(),
            obstacle_type: ObstacleType::Bicycle,
            sub_type: ObstacleSubType::Unrecognized(99),
        };
        let value = serde_json::to_value(&obstacle).unwrap();
        assert_eq!(value["type"], 4);
        assert_eq!(value["sub_type"], 99);

        let back: PrefusedObstacle = serde_json::from_value(value).unwrap();
        assert_eq!(back, obstacle);
    }
}
