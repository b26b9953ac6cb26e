//! CaptureSink - keeps published records in memory

use std::sync::{Arc, Mutex, MutexGuard};

use contracts::{ContractError, DataSink, PrefusedObstacles};
use tracing::debug;

/// Sink that stores every record it receives
///
/// Read the stored records through the [`CaptureHandle`] returned by
/// [`CaptureSink::new`]; the sink itself moves into its worker task.
pub struct CaptureSink {
    name: String,
    records: Arc<Mutex<Vec<PrefusedObstacles>>>,
}

/// Read side of a [`CaptureSink`]
#[derive(Debug, Clone, Default)]
pub struct CaptureHandle {
    records: Arc<Mutex<Vec<PrefusedObstacles>>>,
}

impl CaptureSink {
    pub fn new(name: impl Into<String>) -> (Self, CaptureHandle) {
        let records = Arc::new(Mutex::new(Vec::new()));
        let sink = Self {
            name: name.into(),
            records: Arc::clone(&records),
        };
        (sink, CaptureHandle { records })
    }
}

impl CaptureHandle {
    /// Copy of all records captured so far, in arrival order
    pub fn records(&self) -> Vec<PrefusedObstacles> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<PrefusedObstacles>> {
        // A poisoned lock still holds valid records
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl DataSink for CaptureSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn write(&mut self, record: &PrefusedObstacles) -> Result<(), ContractError> {
        self.records
            .lock()
            .map_err(|_| ContractError::sink_write(&self.name, "capture buffer poisoned"))?
            .push(record.clone());
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), ContractError> {
        Ok(())
    }

    async fn close(&mut self) -> Result<(), ContractError> {
        debug!(sink = %self.name, "CaptureSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_capture_keeps_order() {
        let (mut sink, handle) = CaptureSink::new("capture");
        assert!(handle.is_empty());

        for seq in 0..3 {
            let mut record = PrefusedObstacles::default();
            record.header.sequence_num = seq;
            sink.write(&record).await.unwrap();
        }

        let seqs: Vec<u32> = handle
            .records()
            .iter()
            .map(|r| r.header.sequence_num)
            .collect();
        assert_eq!(seqs, vec![0, 1, 2]);
        assert_eq!(handle.len(), 3);
    }
}
