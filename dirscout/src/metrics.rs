use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// The shared result counter.
///
/// Every inspector worker increments it once per reported match; the driver
/// reads it after all workers are joined.
#[derive(Debug, Default)]
pub struct MatchCounter {
    matches: AtomicU64,
}

impl MatchCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one match, returning the updated total
    pub fn increment(&self) -> u64 {
        self.matches.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn get(&self) -> u64 {
        self.matches.load(Ordering::Relaxed)
    }
}

/// Tracks per-stage progress of a pipeline run
#[derive(Debug, Default)]
pub struct PipelineMetrics {
    directories_discovered: AtomicU64,
    files_enumerated: AtomicU64,
    files_inspected: AtomicU64,
    access_errors: AtomicU64,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a directory handed to the enumerator stage
    pub fn record_directory(&self) {
        self.directories_discovered.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a file handed to the inspector pool
    pub fn record_file_enumerated(&self) {
        self.files_enumerated.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a file fully processed by an inspector
    pub fn record_file_inspected(&self) {
        self.files_inspected.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a skipped directory or file
    pub fn record_access_error(&self) {
        self.access_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_stats(&self) -> PipelineStats {
        PipelineStats {
            directories_discovered: self.directories_discovered.load(Ordering::Relaxed),
            files_enumerated: self.files_enumerated.load(Ordering::Relaxed),
            files_inspected: self.files_inspected.load(Ordering::Relaxed),
            access_errors: self.access_errors.load(Ordering::Relaxed),
        }
    }

    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Pipeline stats:\n\
             Directories discovered: {}\n\
             Files enumerated/inspected: {}/{}\n\
             Access errors: {}",
            stats.directories_discovered,
            stats.files_enumerated,
            stats.files_inspected,
            stats.access_errors
        );
    }
}

/// Snapshot of [`PipelineMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub directories_discovered: u64,
    pub files_enumerated: u64,
    pub files_inspected: u64,
    pub access_errors: u64,
}
