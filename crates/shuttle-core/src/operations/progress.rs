//! Progress reporting for streamed blob copies.

use std::time::Duration;

/// Progress of one file copy, reported after every chunk.
#[derive(Debug, Clone)]
pub struct CopyProgress {
    /// Filename being copied (digest or version tag).
    pub file_name: String,
    /// Bytes written so far.
    pub bytes_copied: u64,
    /// Size of the source file.
    pub total_bytes: u64,
    /// Time since the copy of this file started.
    pub elapsed: Duration,
    /// Throughput of the most recent chunk.
    pub speed_bytes_per_sec: f64,
}

impl CopyProgress {
    /// Percentage complete, clamped to 0-100.
    ///
    /// Empty files report 100 since there is nothing left to copy.
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        let percent = (self.bytes_copied as f64 / self.total_bytes as f64) * 100.0;
        percent.clamp(0.0, 100.0)
    }

    pub fn is_complete(&self) -> bool {
        self.bytes_copied >= self.total_bytes
    }
}

/// Callback invoked with every progress update.
pub type ProgressCallback = Box<dyn FnMut(&CopyProgress)>;
