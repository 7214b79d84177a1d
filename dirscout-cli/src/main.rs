mod output;

use anyhow::Result;
use clap::Parser;
use dirscout::{
    run_search, CliOverrides, EncodingMode, SearchConfig, SearchError, SearchMode, TraversalMode,
};
use output::ConsoleSink;
use std::{num::NonZeroUsize, path::PathBuf, process::ExitCode};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Concurrent file name and content search", long_about = None)]
struct Cli {
    /// Text to look for (plain, case-sensitive substring)
    query: String,

    /// Directory to search
    root: PathBuf,

    /// Match against file names instead of file contents
    #[arg(short = 'n', long = "name", conflicts_with = "content")]
    name: bool,

    /// Match against file contents (the default unless a config file says otherwise)
    #[arg(long)]
    content: bool,

    /// Descend into all subdirectories
    #[arg(short = 'r', long)]
    recursive: bool,

    /// Number of inspector threads
    #[arg(short = 'j', long)]
    threads: Option<NonZeroUsize>,

    /// Capacity of each bounded queue between stages
    #[arg(long)]
    queue_capacity: Option<NonZeroUsize>,

    /// Number of enumerator threads
    #[arg(long)]
    enumerators: Option<NonZeroUsize>,

    /// Patterns to ignore (glob format)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// How to handle invalid UTF-8 sequences
    #[arg(long, value_parser = ["lossy", "failfast"])]
    encoding: Option<String>,

    /// Show only the summary, not individual matches
    #[arg(short, long)]
    stats: bool,

    /// Configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Collects only the flags that were given, so they win over file values
    fn overrides(&self) -> CliOverrides {
        let search_mode = if self.name {
            Some(SearchMode::NameMatch)
        } else if self.content {
            Some(SearchMode::ContentMatch)
        } else {
            None
        };

        CliOverrides {
            query: self.query.clone(),
            root_path: self.root.clone(),
            search_mode,
            traversal: self.recursive.then_some(TraversalMode::AllSubdirectories),
            worker_count: self.threads,
            enumerator_count: self.enumerators,
            queue_capacity: self.queue_capacity,
            ignore_patterns: self.ignore.clone(),
            encoding_mode: self.encoding.as_deref().map(|e| match e {
                "failfast" => EncodingMode::FailFast,
                _ => EncodingMode::Lossy,
            }),
            stats_only: self.stats,
            log_level: self.verbose.then(|| "debug".to_string()),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = SearchConfig::load_from(cli.config.as_deref())
        .map_err(|e| SearchError::config_error(e.to_string()))?
        .merge_with_cli(cli.overrides());

    setup_logging(&config.log_level);
    debug!(
        "Effective configuration: root={} mode={:?} traversal={:?} workers={} enumerators={} capacity={}",
        config.root_path.display(),
        config.search_mode,
        config.traversal,
        config.worker_count,
        config.enumerator_count,
        config.queue_capacity
    );
    config.validate()?;

    let sink = ConsoleSink::new(config.stats_only);
    let summary = run_search(&config, &sink)?;
    output::print_summary(&summary);
    Ok(())
}

fn setup_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
