//! Run summary collected by the executor.

use std::fmt;
use std::time::Duration;

use indexmap::IndexMap;

/// Per-stream counters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StreamMetrics {
    /// Steps written.
    pub writes: u64,
    /// Steps read successfully.
    pub reads: u64,
    /// Reads that returned not-ready or end-of-stream.
    pub failed_reads: u64,
    /// Variables fetched from the stream across all reads.
    pub variables_supplied: u64,
    /// Selected variables a successful read did not find.
    pub variables_missing: u64,
}

/// What one process did over a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunMetrics {
    /// Steps executed.
    pub steps: u64,
    /// Counters per stream, in stream-plan order.
    pub streams: IndexMap<String, StreamMetrics>,
    /// Commands skipped because their condition was false.
    pub skipped_commands: u64,
    /// Total time requested by sleep commands.
    pub sleep: Duration,
    /// Wall-clock time from opening the first stream to closing the last.
    pub wall: Duration,
}

impl RunMetrics {
    /// Counters for `stream`, created on first use.
    pub fn stream_mut(&mut self, stream: &str) -> &mut StreamMetrics {
        if !self.streams.contains_key(stream) {
            self.streams.insert(stream.to_string(), StreamMetrics::default());
        }
        &mut self.streams[stream]
    }

    /// Counters for `stream`, if it was used.
    pub fn stream(&self, stream: &str) -> Option<&StreamMetrics> {
        self.streams.get(stream)
    }
}

impl fmt::Display for RunMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} steps in {:.3}s (slept {:.3}s, skipped {} commands)",
            self.steps,
            self.wall.as_secs_f64(),
            self.sleep.as_secs_f64(),
            self.skipped_commands
        )?;
        for (name, s) in &self.streams {
            write!(
                f,
                "; {name}: {} writes, {} reads, {} failed",
                s.writes, s.reads, s.failed_reads
            )?;
        }
        Ok(())
    }
}
