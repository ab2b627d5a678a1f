//! Progress reporting callbacks.

use std::sync::atomic::{AtomicU64, Ordering};

/// Callbacks the pipeline emits while hashing.
///
/// All methods default to no-ops. Implementations must be cheap: they
/// run on the orchestrator's read loop.
pub trait Progress: Send + Sync {
    /// A file's stream is about to be read.
    fn on_file_open(&self, _path: &str) {}

    /// `n` more input bytes were read.
    fn on_bytes_read(&self, _n: u64) {}

    /// A dispatched batch covering `n` input bytes finished hashing.
    fn on_bytes_hashed(&self, _n: u64) {}
}

/// Ignores all progress events.
pub struct NoProgress;

impl Progress for NoProgress {}

/// Aggregates progress events into a completion fraction.
///
/// Reading and hashing each account for half of the work, so the
/// fraction is `(read + hashed) / (2 * total)`. It is non-decreasing
/// and reaches exactly 1.0 when the pipeline finishes.
pub struct ProgressCounter {
    read: AtomicU64,
    hashed: AtomicU64,
    total: u64,
}

impl ProgressCounter {
    pub fn new(total: u64) -> Self {
        Self {
            read: AtomicU64::new(0),
            hashed: AtomicU64::new(0),
            total,
        }
    }

    /// Completion fraction in `[0, 1]`. An empty input counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 1.0;
        }
        let done = self.read.load(Ordering::Relaxed) + self.hashed.load(Ordering::Relaxed);
        (done as f64 / (2 * self.total) as f64).clamp(0.0, 1.0)
    }

    pub fn bytes_read(&self) -> u64 {
        self.read.load(Ordering::Relaxed)
    }

    pub fn bytes_hashed(&self) -> u64 {
        self.hashed.load(Ordering::Relaxed)
    }
}

impl Progress for ProgressCounter {
    fn on_bytes_read(&self, n: u64) {
        self.read.fetch_add(n, Ordering::Relaxed);
    }

    fn on_bytes_hashed(&self, n: u64) {
        self.hashed.fetch_add(n, Ordering::Relaxed);
    }
}
