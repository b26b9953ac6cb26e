//! Classification code mapping
//!
//! Inbound detection codes and outbound obstacle enumerations are defined
//! independently. Today they share integer encodings, so both mappings are
//! identity on the code. Any future divergence is fixed here and nowhere else.

use contracts::{ObstacleSubType, ObstacleType};

/// Map a detection type code to the obstacle type
///
/// Codes outside the known domain are passed through as `Unrecognized`.
pub fn map_object_type(code: i32) -> ObstacleType {
    ObstacleType::from_code(code)
}

/// Map a detection sub-type code to the obstacle sub-type
///
/// Codes outside the known domain are passed through as `Unrecognized`.
pub fn map_object_sub_type(code: i32) -> ObstacleSubType {
    ObstacleSubType::from_code(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_mapping_preserves_code() {
        for code in -2..10 {
            assert_eq!(map_object_type(code).code(), code);
        }
    }

    #[test]
    fn test_sub_type_mapping_preserves_code() {
        for code in -2..16 {
            assert_eq!(map_object_sub_type(code).code(), code);
        }
    }

    #[test]
    fn test_named_variants() {
        assert_eq!(map_object_type(3), ObstacleType::Pedestrian);
        assert_eq!(map_object_sub_type(3), ObstacleSubType::Car);
        assert_eq!(map_object_sub_type(12), ObstacleSubType::Unrecognized(12));
    }
}
