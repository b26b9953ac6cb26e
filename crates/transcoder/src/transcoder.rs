//! Frame transcoding.

use contracts::{
    DetectedObject, Header, Hull, PrefusedObstacle, PrefusedObstacles, SensorFrameMessage,
};
use observability::{record_empty_frame, record_frame_received, record_frame_transcoded};
use tracing::info;

use crate::mapping::{map_object_sub_type, map_object_type};

/// Stateless-per-message transcoder
///
/// The only state is the sequence counter, owned by this instance. Every
/// call to [`Transcoder::transcode`] consumes exactly one sequence number.
#[derive(Debug, Default)]
pub struct Transcoder {
    /// Sequence number for the next record
    seq_num: u32,
    /// Messages transcoded so far
    frames: u64,
}

impl Transcoder {
    /// Create a transcoder with the counter at 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number the next record will carry
    pub fn sequence_num(&self) -> u32 {
        self.seq_num
    }

    /// Number of messages transcoded
    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    /// Build the outbound record for one inbound message
    ///
    /// Never fails. An absent detection result yields a record with no
    /// obstacles; the counter still advances.
    pub fn transcode(&mut self, msg: &SensorFrameMessage) -> PrefusedObstacles {
        info!(sensor_id = %msg.sensor_id, timestamp = msg.timestamp, "Prefuse");
        record_frame_received(&msg.sensor_id);

        let mut record = PrefusedObstacles {
            header: Header {
                timestamp_sec: msg.timestamp,
                sequence_num: self.next_sequence_num(),
            },
            sensor_name: msg.sensor_id.clone(),
            obstacles: Vec::new(),
        };

        match msg.frame.as_deref() {
            Some(frame) => {
                info!(
                    measurement = %frame.sensor_info.name,
                    obj_cnt = frame.objects.len(),
                    frame_timestamp = frame.timestamp,
                    "Measurement"
                );
                record.obstacles = frame.objects.iter().map(to_obstacle).collect();
            }
            None => {
                info!(sensor_id = %msg.sensor_id, "Empty frame");
                record_empty_frame(&msg.sensor_id);
            }
        }

        record_frame_transcoded(record.header.sequence_num, record.obstacles.len());
        record
    }

    fn next_sequence_num(&mut self) -> u32 {
        let current = self.seq_num;
        self.seq_num = self.seq_num.wrapping_add(1);
        self.frames += 1;
        current
    }
}

fn to_obstacle(object: &DetectedObject) -> PrefusedObstacle {
    PrefusedObstacle {
        theta: object.theta,
        hull: Hull {
            points: object.polygon.clone(),
        },
        obstacle_type: map_object_type(object.object_type),
        sub_type: map_object_sub_type(object.sub_type),
    }
}
