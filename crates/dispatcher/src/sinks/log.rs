//! LogSink - logs record summary via tracing

use contracts::{ContractError, DataSink, PrefusedObstacles};
use tracing::{info, instrument};

/// Sink that logs record summaries for debugging
pub struct LogSink {
    name: String,
}

impl LogSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_record_summary(&self, record: &PrefusedObstacles) {
        let hull_points: usize = record
            .obstacles
            .iter()
            .map(|obstacle| obstacle.hull.points.len())
            .sum();

        info!(
            sink = %self.name,
            sequence_num = record.header.sequence_num,
            timestamp_sec = record.header.timestamp_sec,
            sensor = %record.sensor_name,
            obstacles = record.obstacles.len(),
            hull_points,
            "PrefusedObstacles published"
        );
    }
}

impl DataSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, record),
        fields(sink = %self.name, sequence_num = record.header.sequence_num)
    )]
    async fn write(&mut self, record: &PrefusedObstacles) -> Result<(), ContractError> {
        self.log_record_summary(record);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
