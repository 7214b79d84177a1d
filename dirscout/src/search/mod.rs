/// This module implements the concurrent search pipeline.
///
/// # Pipeline Stages
///
/// A search runs as three stages connected by two bounded queues:
///
/// ```text
/// discoverer ──[pending directories]──> enumerator(s) ──[pending files]──> inspector pool
/// ```
///
/// 1. **Discoverer** (one thread) emits the root directory and, when recursing,
///    every descendant directory in depth-first order.
/// 2. **Enumerator** (one thread by default) lists the files directly inside each
///    directory it receives.
/// 3. **Inspector pool** (`worker_count` threads) matches each file by name or by
///    line content, reports every match and bumps the shared counter.
///
/// All stages run at the same time: inspectors start searching while the tree is
/// still being walked. Because both queues are bounded, a fast producer blocks
/// once its queue is full, so memory stays proportional to the queue capacity
/// rather than to the size of the tree.
///
/// # Shutdown
///
/// Termination cascades in pipeline order. The discoverer closes the directory
/// queue when it is done; each enumerator exits once that queue is closed and
/// drained; the driver closes the file queue after joining every enumerator;
/// inspectors exit once the file queue is closed and drained.
///
/// # Error Handling
///
/// A directory or file that cannot be read is reported through
/// [`MatchSink::on_error`](crate::results::MatchSink::on_error) and skipped.
/// No access error ever stops a stage.
pub mod discoverer;
pub mod engine;
pub mod enumerator;
pub mod inspector;
pub mod matcher;
pub mod queue;

pub use engine::{run_search, run_search_with};
pub use inspector::FileInspector;
pub use matcher::QueryMatcher;

use tracing::debug;

use crate::errors::SearchError;
use crate::filters::IgnoreFilter;
use crate::fs::FileSystem;
use crate::metrics::PipelineMetrics;
use crate::results::MatchSink;

/// Collaborators shared by every stage of one run
pub struct StageContext<'a> {
    pub fs: &'a dyn FileSystem,
    pub sink: &'a dyn MatchSink,
    pub metrics: &'a PipelineMetrics,
    pub filter: &'a IgnoreFilter,
}

impl<'a> StageContext<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        sink: &'a dyn MatchSink,
        metrics: &'a PipelineMetrics,
        filter: &'a IgnoreFilter,
    ) -> Self {
        Self {
            fs,
            sink,
            metrics,
            filter,
        }
    }

    /// Reports a skipped directory or file and lets the stage carry on
    pub fn report_error(&self, error: SearchError) {
        debug!("Skipping {:?}: {}", error.path(), error);
        self.metrics.record_access_error();
        self.sink.on_error(&error);
    }
}
