//! Run statistics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::MetricsSummary;

use super::RunExit;

/// Statistics from a daemon run
#[derive(Debug, Clone)]
pub struct RunStats {
    pub exit: RunExit,

    /// Wall time from start to dispatcher drain
    pub duration: Duration,

    /// Acquisition counters
    pub summary: MetricsSummary,

    /// Final per-sink totals
    pub sinks: Vec<(String, MetricsSnapshot)>,

    /// Batches accepted by the publish queue
    pub publish_accepted: u64,

    /// Batches dropped because the publish queue was full or closed
    pub publish_dropped: u64,
}

impl RunStats {
    /// Published batches per second
    pub fn batch_rate(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.summary.total_batches as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    pub fn print_summary(&self) {
        println!("\n=== sensord run statistics ===\n");

        println!("Overview");
        println!("  Exit: {:?}", self.exit);
        println!("  Duration: {:.2}s", self.duration.as_secs_f64());
        println!("  Batch rate: {:.2}/s", self.batch_rate());

        println!("\nAcquisition");
        println!("{}", self.summary);

        println!("\nPublish queue");
        println!("  Accepted: {}", self.publish_accepted);
        println!("  Dropped: {}", self.publish_dropped);

        if !self.sinks.is_empty() {
            println!("\nSinks");
            for (name, snapshot) in &self.sinks {
                println!(
                    "  {}: written {}, failed {}, dropped {}",
                    name, snapshot.write_count, snapshot.failure_count, snapshot.dropped_count
                );
            }
        }

        println!();
    }
}
