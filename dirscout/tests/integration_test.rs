use anyhow::Result;
use dirscout::fs::Lines;
use dirscout::{
    run_search, run_search_with, EncodingMode, FileMetadata, FileSystem, LocalFileSystem,
    MatchRecord, MatchSink, MemorySink, SearchConfig, SearchMode, SearchResult, SearchSummary,
    TraversalMode,
};
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::Duration;
use tempfile::tempdir;

/// Builds `depth` levels of `fanout` subdirectories, each holding `files_per_dir` files.
/// Returns every file path created.
fn create_tree(root: &Path, depth: usize, fanout: usize, files_per_dir: usize) -> Result<Vec<PathBuf>> {
    let mut created = Vec::new();
    for i in 0..files_per_dir {
        let path = root.join(format!("file_{}.txt", i));
        let mut file = File::create(&path)?;
        writeln!(file, "Line 1: TODO implement this")?;
        writeln!(file, "Line 2: nothing special")?;
        writeln!(file, "Line 3: another TODO here")?;
        created.push(path);
    }
    if depth > 0 {
        for d in 0..fanout {
            let sub = root.join(format!("dir_{}", d));
            fs::create_dir(&sub)?;
            created.extend(create_tree(&sub, depth - 1, fanout, files_per_dir)?);
        }
    }
    Ok(created)
}

fn config(query: &str, root: &Path, mode: SearchMode, traversal: TraversalMode) -> SearchConfig {
    let mut config = SearchConfig::new(query, root);
    config.search_mode = mode;
    config.traversal = traversal;
    config.worker_count = NonZeroUsize::new(4).unwrap();
    config
}

fn matched_paths(sink: &MemorySink) -> BTreeSet<PathBuf> {
    sink.records().into_iter().map(|r| r.path).collect()
}

#[test]
fn test_recursive_search_visits_every_file_once() -> Result<()> {
    let dir = tempdir()?;
    let created = create_tree(dir.path(), 3, 3, 4)?;

    // Every file name contains "file_", so each file is reported exactly once
    let sink = MemorySink::new();
    let config = config(
        "file_",
        dir.path(),
        SearchMode::NameMatch,
        TraversalMode::AllSubdirectories,
    );
    let summary = run_search(&config, &sink)?;

    let records = sink.records();
    let unique = matched_paths(&sink);
    let expected: BTreeSet<PathBuf> = created.into_iter().collect();

    assert_eq!(records.len(), expected.len(), "no duplicates");
    assert_eq!(unique, expected, "no omissions");
    assert_eq!(summary.total_matches, expected.len() as u64);
    assert_eq!(summary.files_enumerated, expected.len() as u64);
    // 1 + 3 + 9 + 27 directories
    assert_eq!(summary.directories, 40);
    Ok(())
}

#[test]
fn test_this_directory_only_skips_subdirectories() -> Result<()> {
    let dir = tempdir()?;
    create_tree(dir.path(), 2, 2, 3)?;

    let sink = MemorySink::new();
    let config = config(
        "file_",
        dir.path(),
        SearchMode::NameMatch,
        TraversalMode::ThisDirectoryOnly,
    );
    let summary = run_search(&config, &sink)?;

    assert_eq!(summary.total_matches, 3);
    assert_eq!(summary.directories, 1);
    assert!(sink
        .records()
        .iter()
        .all(|r| r.path.parent() == Some(dir.path())));
    Ok(())
}

#[test]
fn test_counter_matches_reports_for_any_worker_count() -> Result<()> {
    let dir = tempdir()?;
    let created = create_tree(dir.path(), 2, 4, 5)?;
    // Two TODO lines per file
    let expected = created.len() as u64 * 2;

    for workers in [1, 4, 64] {
        for _ in 0..3 {
            let sink = MemorySink::new();
            let mut config = config(
                "TODO",
                dir.path(),
                SearchMode::ContentMatch,
                TraversalMode::AllSubdirectories,
            );
            config.worker_count = NonZeroUsize::new(workers).unwrap();

            let summary = run_search(&config, &sink)?;
            assert_eq!(summary.total_matches, expected, "workers = {}", workers);
            assert_eq!(sink.records().len() as u64, expected, "workers = {}", workers);
        }
    }
    Ok(())
}

#[test]
fn test_multiple_enumerators_keep_completeness() -> Result<()> {
    let dir = tempdir()?;
    let created = create_tree(dir.path(), 2, 5, 3)?;

    let sink = MemorySink::new();
    let mut config = config(
        "file_",
        dir.path(),
        SearchMode::NameMatch,
        TraversalMode::AllSubdirectories,
    );
    config.enumerator_count = NonZeroUsize::new(4).unwrap();

    let summary = run_search(&config, &sink)?;
    assert_eq!(summary.total_matches, created.len() as u64);
    assert_eq!(
        matched_paths(&sink),
        created.into_iter().collect::<BTreeSet<_>>()
    );
    Ok(())
}

/// Local filesystem that counts how many directories have been listed for files
struct CountingFs {
    inner: LocalFileSystem,
    file_listings: AtomicUsize,
}

impl FileSystem for CountingFs {
    fn list_subdirectories(&self, path: &Path) -> SearchResult<Vec<PathBuf>> {
        self.inner.list_subdirectories(path)
    }

    fn list_files(&self, path: &Path) -> SearchResult<Vec<PathBuf>> {
        self.file_listings.fetch_add(1, Ordering::SeqCst);
        self.inner.list_files(path)
    }

    fn read_lines(&self, path: &Path) -> SearchResult<Lines> {
        self.inner.read_lines(path)
    }

    fn metadata(&self, path: &Path) -> SearchResult<FileMetadata> {
        self.inner.metadata(path)
    }
}

/// Sink that blocks every match until the gate is released
struct GatedSink {
    gate: Mutex<()>,
    inner: MemorySink,
}

impl MatchSink for GatedSink {
    fn on_match(&self, record: &MatchRecord) {
        let _open = self.gate.lock().unwrap_or_else(|p| p.into_inner());
        self.inner.on_match(record);
    }
}

#[test]
fn test_stalled_inspector_blocks_producers() -> Result<()> {
    let dir = tempdir()?;
    // 30 directories holding one file each, far more than the queues hold
    for i in 0..30 {
        let sub = dir.path().join(format!("dir_{:02}", i));
        fs::create_dir(&sub)?;
        fs::write(sub.join("file.txt"), "TODO")?;
    }

    let capacity = 4;
    let fs = CountingFs {
        inner: LocalFileSystem::default(),
        file_listings: AtomicUsize::new(0),
    };
    let sink = GatedSink {
        gate: Mutex::new(()),
        inner: MemorySink::new(),
    };
    let mut config = config(
        "TODO",
        dir.path(),
        SearchMode::ContentMatch,
        TraversalMode::AllSubdirectories,
    );
    config.queue_capacity = NonZeroUsize::new(capacity).unwrap();
    config.worker_count = NonZeroUsize::new(1).unwrap();

    let gate = sink.gate.lock().unwrap();
    let summary = thread::scope(|s| {
        let search = s.spawn(|| run_search_with(&config, &fs, &sink));

        thread::sleep(Duration::from_millis(500));
        // The inspector holds one file, the file queue holds `capacity` more and
        // the enumerator is blocked sending the next one. Root listing included.
        let listed = fs.file_listings.load(Ordering::SeqCst);
        assert!(
            listed <= capacity + 3,
            "enumerator kept listing while the inspector was stalled: {}",
            listed
        );

        drop(gate);
        search.join().unwrap()
    })?;

    assert_eq!(summary.total_matches, 30);
    assert_eq!(fs.file_listings.load(Ordering::SeqCst), 31);
    assert_eq!(sink.inner.records().len(), 30);
    Ok(())
}

#[test]
fn test_content_match_line_numbers() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("greek.txt"), "alpha\nbeta\nalpha")?;

    let sink = MemorySink::new();
    let config = config(
        "alpha",
        dir.path(),
        SearchMode::ContentMatch,
        TraversalMode::ThisDirectoryOnly,
    );
    let summary = run_search(&config, &sink)?;

    assert_eq!(summary.total_matches, 2);
    let lines: Vec<_> = sink.records().iter().map(|r| r.line_number).collect();
    assert_eq!(lines, vec![Some(1), Some(3)]);
    Ok(())
}

#[test]
fn test_name_match_is_plain_case_sensitive_substring() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("report_final.txt"), "contents")?;

    let run = |query: &str| -> Result<SearchSummary> {
        let sink = MemorySink::new();
        let config = config(
            query,
            dir.path(),
            SearchMode::NameMatch,
            TraversalMode::ThisDirectoryOnly,
        );
        Ok(run_search(&config, &sink)?)
    };

    assert_eq!(run("final")?.total_matches, 1);
    assert_eq!(run("Final")?.total_matches, 0);
    assert_eq!(run("finalreport")?.total_matches, 0);
    assert_eq!(run("report_*.txt")?.total_matches, 0);
    Ok(())
}

#[test]
fn test_empty_directory_terminates() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path().to_path_buf();

    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let sink = MemorySink::new();
        let mut config = SearchConfig::new("anything", &root);
        config.traversal = TraversalMode::AllSubdirectories;
        config.worker_count = NonZeroUsize::new(8).unwrap();
        let _ = tx.send(run_search(&config, &sink).map(|s| s.total_matches));
    });

    let total = rx
        .recv_timeout(Duration::from_secs(30))
        .expect("pipeline did not terminate")?;
    assert_eq!(total, 0);
    Ok(())
}

#[test]
fn test_invalid_utf8_handling() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("mixed.txt"), b"needle\n\xff\xfe needle\nneedle\n")?;
    fs::write(dir.path().join("clean.txt"), "needle\n")?;

    let sink = MemorySink::new();
    let lossy = config(
        "needle",
        dir.path(),
        SearchMode::ContentMatch,
        TraversalMode::ThisDirectoryOnly,
    );
    assert_eq!(run_search(&lossy, &sink)?.total_matches, 4);
    assert!(sink.errors().is_empty());

    let sink = MemorySink::new();
    let mut strict = lossy.clone();
    strict.encoding_mode = EncodingMode::FailFast;
    let summary = run_search(&strict, &sink)?;

    // Line 1 of mixed.txt is reported before the bad line stops that file
    assert_eq!(summary.total_matches, 2);
    assert_eq!(summary.errors, 1);
    assert_eq!(sink.errors().len(), 1);
    assert!(sink.errors()[0].contains("Invalid UTF-8"));
    Ok(())
}

#[test]
fn test_ignore_patterns() -> Result<()> {
    let dir = tempdir()?;
    create_tree(dir.path(), 1, 2, 2)?;
    fs::write(dir.path().join("skip.log"), "TODO in a log")?;

    let sink = MemorySink::new();
    let mut config = config(
        "TODO",
        dir.path(),
        SearchMode::ContentMatch,
        TraversalMode::AllSubdirectories,
    );
    config.ignore_patterns = vec!["**/dir_0".to_string(), "**/*.log".to_string()];

    let summary = run_search(&config, &sink)?;
    // root and dir_1 hold two files each, two TODO lines per file
    assert_eq!(summary.total_matches, 8);
    assert_eq!(summary.directories, 2);
    assert!(sink
        .records()
        .iter()
        .all(|r| !r.path.to_string_lossy().contains("dir_0")));
    Ok(())
}

#[test]
fn test_match_metadata() -> Result<()> {
    let dir = tempdir()?;
    fs::write(dir.path().join("sized.txt"), "0123456789")?;

    let sink = MemorySink::new();
    let config = config(
        "sized",
        dir.path(),
        SearchMode::NameMatch,
        TraversalMode::ThisDirectoryOnly,
    );
    run_search(&config, &sink)?;

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].size, 10);
    assert!(records[0].created.is_some());
    assert_eq!(records[0].line_number, None);
    Ok(())
}
