use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::errors::{SearchError, SearchResult};
use crate::filters::IgnoreFilter;

/// Capacity of each bounded hand-off queue unless configured otherwise
pub const DEFAULT_QUEUE_CAPACITY: usize = 2000;

/// What the inspector pool looks at in each file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    /// Match the query against the file's base name
    NameMatch,
    /// Match the query against every line of the file
    #[default]
    ContentMatch,
}

/// How far the directory discoverer walks from the root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraversalMode {
    #[default]
    ThisDirectoryOnly,
    AllSubdirectories,
}

/// How to handle lines that are not valid UTF-8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncodingMode {
    /// Skip the rest of the file and report an encoding error
    FailFast,
    /// Replace invalid sequences with U+FFFD and keep scanning
    #[default]
    Lossy,
}

/// Configuration for a search run.
///
/// # Configuration Locations
///
/// The configuration can be loaded from multiple locations, later ones winning:
/// 1. Global `$HOME/.config/dirscout/config.yaml`
/// 2. Local `.dirscout.yaml` in the current directory
/// 3. Custom config file specified via `--config` flag
///
/// # Configuration Format
///
/// ```yaml
/// query: "TODO"
/// root_path: "src"
/// search_mode: content_match      # or name_match
/// traversal: all_subdirectories   # or this_directory_only
/// worker_count: 12
/// enumerator_count: 1
/// queue_capacity: 2000
/// ignore_patterns:
///   - "**/target/**"
/// encoding_mode: lossy            # or fail_fast
/// stats_only: false
/// log_level: "warn"
/// ```
///
/// Command-line arguments take precedence over file values, see `merge_with_cli`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Substring to look for (plain, case-sensitive)
    #[serde(default)]
    pub query: String,

    /// Directory the search starts from
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    #[serde(default)]
    pub search_mode: SearchMode,

    #[serde(default)]
    pub traversal: TraversalMode,

    /// Number of file inspector workers
    /// Defaults to number of CPU cores if not specified
    #[serde(default = "default_worker_count")]
    pub worker_count: NonZeroUsize,

    /// Number of file enumerator workers
    #[serde(default = "default_enumerator_count")]
    pub enumerator_count: NonZeroUsize,

    /// Capacity of the pending-directory and pending-file queues
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: NonZeroUsize,

    /// Glob patterns for directories and files to skip
    /// Examples:
    /// - "**/target": do not descend into any target/ directory
    /// - "**/*.min.js": do not inspect minified JS files
    #[serde(default)]
    pub ignore_patterns: Vec<String>,

    #[serde(default)]
    pub encoding_mode: EncodingMode,

    /// Whether to only show the summary instead of individual matches
    #[serde(default)]
    pub stats_only: bool,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_root_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_worker_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_enumerator_count() -> NonZeroUsize {
    NonZeroUsize::MIN
}

fn default_queue_capacity() -> NonZeroUsize {
    NonZeroUsize::new(DEFAULT_QUEUE_CAPACITY).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            query: String::new(),
            root_path: default_root_path(),
            search_mode: SearchMode::default(),
            traversal: TraversalMode::default(),
            worker_count: default_worker_count(),
            enumerator_count: default_enumerator_count(),
            queue_capacity: default_queue_capacity(),
            ignore_patterns: Vec::new(),
            encoding_mode: EncodingMode::default(),
            stats_only: false,
            log_level: default_log_level(),
        }
    }
}

/// Settings given on the command line.
///
/// `None` means the flag was absent and the configuration file value stands.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub query: String,
    pub root_path: PathBuf,
    pub search_mode: Option<SearchMode>,
    pub traversal: Option<TraversalMode>,
    pub worker_count: Option<NonZeroUsize>,
    pub enumerator_count: Option<NonZeroUsize>,
    pub queue_capacity: Option<NonZeroUsize>,
    pub ignore_patterns: Vec<String>,
    pub encoding_mode: Option<EncodingMode>,
    pub stats_only: bool,
    pub log_level: Option<String>,
}

impl SearchConfig {
    /// Creates a configuration for `query` under `root_path` with default settings
    pub fn new(query: impl Into<String>, root_path: impl Into<PathBuf>) -> Self {
        Self {
            query: query.into(),
            root_path: root_path.into(),
            ..Self::default()
        }
    }

    /// Loads configuration from the default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads configuration from the default locations plus a specific file
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let defaults = [
            dirs::config_dir().map(|p| p.join("dirscout/config.yaml")),
            Some(PathBuf::from(".dirscout.yaml")),
        ];

        for path in defaults.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        // An explicitly requested file must exist
        if let Some(path) = config_path {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder.build()?.try_deserialize()
    }

    /// Applies command-line arguments on top of configuration file values.
    ///
    /// The query and starting directory always come from the command line.
    /// Every other field is replaced only when the flag was actually given.
    pub fn merge_with_cli(mut self, cli: CliOverrides) -> Self {
        self.query = cli.query;
        self.root_path = cli.root_path;
        if let Some(mode) = cli.search_mode {
            self.search_mode = mode;
        }
        if let Some(traversal) = cli.traversal {
            self.traversal = traversal;
        }
        if let Some(workers) = cli.worker_count {
            self.worker_count = workers;
        }
        if let Some(enumerators) = cli.enumerator_count {
            self.enumerator_count = enumerators;
        }
        if let Some(capacity) = cli.queue_capacity {
            self.queue_capacity = capacity;
        }
        if !cli.ignore_patterns.is_empty() {
            self.ignore_patterns = cli.ignore_patterns;
        }
        if let Some(encoding) = cli.encoding_mode {
            self.encoding_mode = encoding;
        }
        if cli.stats_only {
            self.stats_only = true;
        }
        if let Some(level) = cli.log_level {
            self.log_level = level;
        }
        self
    }

    /// Checks the configuration, including the starting directory on disk
    pub fn validate(&self) -> SearchResult<()> {
        self.validate_settings()?;
        if !self.root_path.exists() {
            return Err(SearchError::config_error(format!(
                "Starting directory does not exist: {}",
                self.root_path.display()
            )));
        }
        if !self.root_path.is_dir() {
            return Err(SearchError::config_error(format!(
                "Starting path is not a directory: {}",
                self.root_path.display()
            )));
        }
        Ok(())
    }

    /// Checks everything that does not depend on the filesystem
    pub fn validate_settings(&self) -> SearchResult<()> {
        if self.query.is_empty() {
            return Err(SearchError::config_error("Search query must not be empty"));
        }
        if self.search_mode == SearchMode::ContentMatch && self.query.contains(['\n', '\r']) {
            return Err(SearchError::config_error(
                "Content search query cannot span multiple lines",
            ));
        }
        IgnoreFilter::new(&self.ignore_patterns)?;
        Ok(())
    }
}
