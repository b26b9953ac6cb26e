//! Pipeline statistics and metrics.

use std::fmt;
use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::TranscodeStatsAggregator;

/// Why the main loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopReason {
    /// All frame sources finished
    #[default]
    InputClosed,
    /// `max_frames` reached
    MaxFrames,
    /// Pipeline timeout elapsed
    Timeout,
    /// Ctrl+C / SIGTERM
    Signal,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            StopReason::InputClosed => "input closed",
            StopReason::MaxFrames => "max frames reached",
            StopReason::Timeout => "timeout",
            StopReason::Signal => "shutdown signal",
        };
        f.write_str(reason)
    }
}

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Records handed to `publish`
    pub records_published: u64,

    /// Records the output channel refused
    pub publish_failures: u64,

    /// Frames accepted by the inbound queue
    pub frames_received: u64,

    /// Frames dropped because the inbound queue was full
    pub frames_dropped: u64,

    /// Sequence number the next record would carry
    pub next_sequence_num: u32,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Number of configured sinks
    pub active_sinks: usize,

    pub stop_reason: StopReason,

    /// Per-record aggregation
    pub transcode: TranscodeStatsAggregator,

    /// Final per-sink counters
    pub sink_metrics: Vec<(String, MetricsSnapshot)>,
}

impl PipelineStats {
    /// Calculate records per second throughput
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.records_published as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Inbound drop rate as percentage
    pub fn drop_rate(&self) -> f64 {
        let total = self.frames_received + self.frames_dropped;
        if total > 0 {
            (self.frames_dropped as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n╔══════════════════════════════════════════════════════════════╗");
        println!("║                 Prefuse Proxy Statistics                     ║");
        println!("╚══════════════════════════════════════════════════════════════╝\n");

        println!("📊 Overview");
        println!("   ├─ Duration: {:.2}s", self.duration.as_secs_f64());
        println!("   ├─ Stop reason: {}", self.stop_reason);
        println!("   ├─ Records published: {}", self.records_published);
        println!("   ├─ Publish failures: {}", self.publish_failures);
        println!("   ├─ Next sequence_num: {}", self.next_sequence_num);
        println!("   ├─ FPS: {:.2}", self.fps());
        println!("   └─ Active sinks: {}", self.active_sinks);

        println!("\n📥 Inbound");
        println!("   ├─ Frames received: {}", self.frames_received);
        println!(
            "   └─ Frames dropped: {} ({:.2}%)",
            self.frames_dropped,
            self.drop_rate()
        );

        println!("\n📈 Transcode");
        for line in self.transcode.summary().to_string().lines() {
            println!("   {}", line);
        }

        if !self.sink_metrics.is_empty() {
            println!("\n📤 Sinks");
            for (name, m) in &self.sink_metrics {
                println!(
                    "   ├─ {}: written={} failed={} dropped={} last_seq={}",
                    name,
                    m.write_count,
                    m.failure_count,
                    m.dropped_count,
                    m.last_sequence_num
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| "-".to_string())
                );
            }
        }

        println!();
    }
}
