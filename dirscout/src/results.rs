/// Match reports and run summaries.
///
/// Matches are not collected into a result tree. Each one is handed to a
/// [`MatchSink`] the moment an inspector finds it, so output streams while the
/// pipeline is still running and memory stays flat. Reports from different
/// workers interleave in no particular order; only the final count is
/// deterministic.
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, SystemTime};

use crate::errors::SearchError;

/// A single match found by an inspector worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    /// The file that matched
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Creation time, if the filesystem records one
    pub created: Option<SystemTime>,
    /// 1-based line number for content matches, `None` for name matches
    pub line_number: Option<usize>,
}

/// Receives matches and access errors as the pipeline produces them.
///
/// Called concurrently from every worker thread.
pub trait MatchSink: Sync {
    fn on_match(&self, record: &MatchRecord);

    fn on_error(&self, _error: &SearchError) {}
}

/// Sink that keeps everything in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<MatchRecord>>,
    errors: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected records sorted by path and line
    pub fn records(&self) -> Vec<MatchRecord> {
        let mut records = self
            .records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        records.sort_by(|a, b| (&a.path, a.line_number).cmp(&(&b.path, b.line_number)));
        records
    }

    /// Returns the collected error messages
    pub fn errors(&self) -> Vec<String> {
        self.errors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl MatchSink for MemorySink {
    fn on_match(&self, record: &MatchRecord) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
    }

    fn on_error(&self, error: &SearchError) {
        self.errors
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(error.to_string());
    }
}

/// Outcome of a completed search run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSummary {
    /// Total number of matches reported
    pub total_matches: u64,
    /// Wall-clock time from stage start to the last worker exiting
    pub elapsed: Duration,
    /// Directories handed to the enumerator stage
    pub directories: u64,
    /// Files handed to the inspector pool
    pub files_enumerated: u64,
    /// Files the inspector pool finished with
    pub files_inspected: u64,
    /// Directories and files skipped because of access errors
    pub errors: u64,
    /// Peak observed depth of the pending-directory queue
    pub peak_directory_queue: usize,
    /// Peak observed depth of the pending-file queue
    pub peak_file_queue: usize,
}

impl SearchSummary {
    pub fn elapsed_millis(&self) -> u128 {
        self.elapsed.as_millis()
    }
}
