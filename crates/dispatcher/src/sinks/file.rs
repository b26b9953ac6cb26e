//! FileSink - appends records to a JSON Lines file

use chrono::Local;
use contracts::{ContractError, DataSink, PrefusedObstacles};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Base output directory
    pub base_path: PathBuf,
    /// Output file name inside `base_path`
    pub file_name: String,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        let file_name = params
            .get("file_name")
            .cloned()
            .unwrap_or_else(default_file_name);

        Self {
            base_path,
            file_name,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.base_path.join(&self.file_name)
    }
}

/// `prefuse_<local time>.jsonl`
fn default_file_name() -> String {
    format!("prefuse_{}.jsonl", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Sink that writes one JSON record per line
pub struct FileSink {
    name: String,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    lines_written: u64,
}

impl FileSink {
    /// Create a new FileSink, creating the output directory if needed
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        fs::create_dir_all(&config.base_path)?;

        let path = config.output_path();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            name: name.into(),
            path,
            writer: Some(BufWriter::new(file)),
            lines_written: 0,
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params);
        Self::new(name, config)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append_line(&mut self, record: &PrefusedObstacles) -> std::io::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| std::io::Error::other("file sink already closed"))?;

        serde_json::to_writer(&mut *writer, record)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writer.write_all(b"\n")?;
        self.lines_written += 1;
        Ok(())
    }

    fn persist_record(&mut self, record: &PrefusedObstacles) -> Result<(), ContractError> {
        self.append_line(record).map_err(|e| {
            error!(
                sink = %self.name,
                sequence_num = record.header.sequence_num,
                error = %e,
                "Write failed"
            );
            ContractError::sink_write(&self.name, e.to_string())
        })
    }

    fn flush_writer(&mut self) -> Result<(), ContractError> {
        if let Some(writer) = self.writer.as_mut() {
            writer
                .flush()
                .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        }
        Ok(())
    }
}

impl DataSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, record),
        fields(sink = %self.name, sequence_num = record.header.sequence_num)
    )]
    async fn write(&mut self, record: &PrefusedObstacles) -> Result<(), ContractError> {
        self.persist_record(record)
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.flush_writer()
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush_writer()?;
        self.writer = None;
        info!(
            sink = %self.name,
            path = %self.path.display(),
            lines = self.lines_written,
            "FileSink closed"
        );
        debug!(sink = %self.name, "FileSink released file handle");
        Ok(())
    }
}
