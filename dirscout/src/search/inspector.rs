use std::path::{Path, PathBuf};
use tracing::{debug, trace};

use super::matcher::QueryMatcher;
use super::queue::QueueReceiver;
use super::StageContext;
use crate::config::SearchMode;
use crate::errors::SearchResult;
use crate::metrics::MatchCounter;
use crate::results::MatchRecord;

/// Applies the search to files pulled from the file queue.
///
/// One inspector is shared by every worker in the pool; all per-file state
/// lives on the worker's stack.
pub struct FileInspector<'a> {
    matcher: QueryMatcher,
    ctx: &'a StageContext<'a>,
    counter: &'a MatchCounter,
}

impl<'a> FileInspector<'a> {
    pub fn new(matcher: QueryMatcher, ctx: &'a StageContext<'a>, counter: &'a MatchCounter) -> Self {
        Self {
            matcher,
            ctx,
            counter,
        }
    }

    /// Worker loop: runs until the file queue is closed and drained
    pub fn run(&self, files: QueueReceiver<PathBuf>) {
        let mut processed = 0usize;
        for path in files.iter() {
            if let Err(e) = self.inspect_file(&path) {
                self.ctx.report_error(e);
            }
            self.ctx.metrics.record_file_inspected();
            processed += 1;
        }
        debug!("Inspector worker exiting after {} files", processed);
    }

    /// Searches a single file, returning the number of matches it reported
    pub fn inspect_file(&self, path: &Path) -> SearchResult<usize> {
        trace!("Inspecting file: {}", path.display());
        match self.matcher.mode() {
            SearchMode::NameMatch => self.inspect_name(path),
            SearchMode::ContentMatch => self.inspect_content(path),
        }
    }

    fn inspect_name(&self, path: &Path) -> SearchResult<usize> {
        if !self.matcher.matches_name(path) {
            return Ok(0);
        }

        let metadata = self.ctx.fs.metadata(path)?;
        self.report(MatchRecord {
            path: path.to_path_buf(),
            size: metadata.size,
            created: metadata.created,
            line_number: None,
        });
        Ok(1)
    }

    fn inspect_content(&self, path: &Path) -> SearchResult<usize> {
        let metadata = self.ctx.fs.metadata(path)?;
        let lines = self.ctx.fs.read_lines(path)?;

        let mut found = 0;
        for (index, line) in lines.enumerate() {
            // Matches already reported stay reported if a later line fails
            let line = line?;
            if self.matcher.matches_line(&line) {
                self.report(MatchRecord {
                    path: path.to_path_buf(),
                    size: metadata.size,
                    created: metadata.created,
                    line_number: Some(index + 1),
                });
                found += 1;
            }
        }
        Ok(found)
    }

    fn report(&self, record: MatchRecord) {
        self.ctx.sink.on_match(&record);
        self.counter.increment();
    }
}
