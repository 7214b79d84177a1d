use std::io;
use std::thread::{self, ScopedJoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

use super::inspector::FileInspector;
use super::matcher::QueryMatcher;
use super::{discoverer, enumerator, queue, StageContext};
use crate::config::SearchConfig;
use crate::errors::{SearchError, SearchResult};
use crate::filters::IgnoreFilter;
use crate::fs::{FileSystem, LocalFileSystem};
use crate::metrics::{MatchCounter, PipelineMetrics};
use crate::results::{MatchSink, SearchSummary};

/// Runs a search against the local filesystem
pub fn run_search(config: &SearchConfig, sink: &dyn MatchSink) -> SearchResult<SearchSummary> {
    config.validate()?;
    let fs = LocalFileSystem::new(config.encoding_mode);
    run_search_with(config, &fs, sink)
}

/// Runs the three-stage search pipeline against `fs`.
///
/// Matches and access errors are streamed to `sink` as they are found. The
/// settings are validated before any stage starts; the root is only checked
/// through `fs` itself.
pub fn run_search_with(
    config: &SearchConfig,
    fs: &dyn FileSystem,
    sink: &dyn MatchSink,
) -> SearchResult<SearchSummary> {
    config.validate_settings()?;
    let filter = IgnoreFilter::new(&config.ignore_patterns)?;

    info!(
        "Starting {:?} search for '{}' in {} ({:?}, {} workers)",
        config.search_mode,
        config.query,
        config.root_path.display(),
        config.traversal,
        config.worker_count
    );

    let metrics = PipelineMetrics::new();
    let counter = MatchCounter::new();
    let ctx = StageContext::new(fs, sink, &metrics, &filter);
    let inspector = FileInspector::new(
        QueryMatcher::new(config.query.as_str(), config.search_mode),
        &ctx,
        &counter,
    );

    let capacity = config.queue_capacity.get();
    let (dir_tx, dir_rx) = queue::bounded(capacity);
    let (file_tx, file_rx) = queue::bounded(capacity);
    let dir_stats = dir_tx.stats();
    let file_stats = file_tx.stats();

    let ctx = &ctx;
    let inspector = &inspector;
    let root = config.root_path.as_path();
    let traversal = config.traversal;

    let start = Instant::now();
    // Every queue handle is moved into the scope so an early return closes them
    let panicked = thread::scope(move |s| -> SearchResult<Vec<String>> {
        let discover_handle = thread::Builder::new()
            .name("dirscout-discover".to_string())
            .spawn_scoped(s, move || discoverer::discover(root, traversal, ctx, dir_tx))?;

        let enumerate_handles = (0..config.enumerator_count.get())
            .map(|i| {
                let directories = dir_rx.clone();
                let files = file_tx.clone();
                thread::Builder::new()
                    .name(format!("dirscout-enumerate-{}", i))
                    .spawn_scoped(s, move || enumerator::enumerate(ctx, directories, files))
            })
            .collect::<io::Result<Vec<_>>>()?;
        drop(dir_rx);

        let inspect_handles = (0..config.worker_count.get())
            .map(|i| {
                let files = file_rx.clone();
                thread::Builder::new()
                    .name(format!("dirscout-inspect-{}", i))
                    .spawn_scoped(s, move || inspector.run(files))
            })
            .collect::<io::Result<Vec<_>>>()?;
        drop(file_rx);

        debug!(
            "Spawned {} enumerator(s) and {} inspector(s)",
            enumerate_handles.len(),
            inspect_handles.len()
        );

        let mut panicked = Vec::new();
        join_stage(discover_handle, &mut panicked);
        for handle in enumerate_handles {
            join_stage(handle, &mut panicked);
        }

        // Enumeration is complete, inspectors can now drain and exit
        file_tx.close();
        for handle in inspect_handles {
            join_stage(handle, &mut panicked);
        }
        Ok(panicked)
    })?;
    let elapsed = start.elapsed();

    if !panicked.is_empty() {
        return Err(SearchError::worker_panicked(panicked.join(", ")));
    }

    metrics.log_stats();
    let stats = metrics.get_stats();
    let summary = SearchSummary {
        total_matches: counter.get(),
        elapsed,
        directories: stats.directories_discovered,
        files_enumerated: stats.files_enumerated,
        files_inspected: stats.files_inspected,
        errors: stats.access_errors,
        peak_directory_queue: dir_stats.peak_depth(),
        peak_file_queue: file_stats.peak_depth(),
    };

    info!(
        "Search complete. Found {} matches in {} files across {} directories in {:?}",
        summary.total_matches, summary.files_inspected, summary.directories, summary.elapsed
    );

    Ok(summary)
}

fn join_stage(handle: ScopedJoinHandle<'_, ()>, panicked: &mut Vec<String>) {
    let name = handle
        .thread()
        .name()
        .unwrap_or("dirscout-worker")
        .to_string();
    if handle.join().is_err() {
        warn!("Stage thread {} panicked", name);
        panicked.push(name);
    }
}
