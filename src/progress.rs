//! Thread-safe progress reporting shared by the scan and emission pools.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Scanning,
    Indexing,
}

impl fmt::Display for ProgressPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scanning => f.write_str("scanning"),
            Self::Indexing => f.write_str("indexing"),
        }
    }
}

/// One progress report.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressInfo {
    pub phase: ProgressPhase,
    /// Item just finished, or a status word.
    pub current: String,
    pub completed: usize,
    pub total: usize,
    /// 0 to 100.
    pub percentage: f64,
    pub elapsed: Duration,
}

impl ProgressInfo {
    pub fn is_complete(&self) -> bool {
        self.percentage >= 100.0
    }
}

/// Invoked from worker threads, possibly concurrently.
pub type ProgressCallback = Arc<dyn Fn(&ProgressInfo) + Send + Sync>;

pub struct ProgressTracker {
    phase: ProgressPhase,
    started: Instant,
    total: usize,
    completed: AtomicUsize,
    callback: Option<ProgressCallback>,
}

impl ProgressTracker {
    /// Creates the tracker and reports the initial zero state.
    pub fn new(phase: ProgressPhase, total: usize, callback: Option<ProgressCallback>) -> Self {
        let tracker = Self {
            phase,
            started: Instant::now(),
            total,
            completed: AtomicUsize::new(0),
            callback,
        };
        tracker.report("Initializing...", 0);
        tracker
    }

    /// Counts one finished item.
    pub fn update(&self, current: &str) {
        let completed = self.completed.fetch_add(1, Ordering::SeqCst) + 1;
        self.report(current, completed);
    }

    /// Reports 100% regardless of how many updates arrived.
    pub fn complete(&self) {
        self.report("Completed", self.total);
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    fn report(&self, current: &str, completed: usize) {
        let Some(callback) = &self.callback else {
            return;
        };

        let percentage = if self.total == 0 {
            100.0
        } else {
            completed as f64 / self.total as f64 * 100.0
        };

        callback(&ProgressInfo {
            phase: self.phase,
            current: current.to_string(),
            completed,
            total: self.total,
            percentage,
            elapsed: self.started.elapsed(),
        });
    }
}
