/// This module defines the error types for dirscout.
///
/// # Error Classes
///
/// Errors fall into two very different classes:
///
/// 1. **Access errors** (`FileNotFound`, `PermissionDenied`, `Access`, `EncodingError`)
///    are raised for a single path while the pipeline is running. They are never
///    fatal: the stage that hit them reports them to the match sink and moves on
///    to the next directory or file.
///
/// 2. **Run errors** (`ConfigError`, `IoError`, `WorkerPanicked`) abort a search.
///    A configuration error is raised before any stage starts; the other two can
///    only surface after the shutdown cascade has finished.
///
/// ```rust,ignore
/// match run_search(&config, &sink) {
///     Ok(summary) => println!("{} total matches.", summary.total_matches),
///     Err(SearchError::ConfigError(msg)) => eprintln!("usage error: {}", msg),
///     Err(e) => eprintln!("search failed: {}", e),
/// }
/// ```
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for search operations
pub type SearchResult<T> = Result<T, SearchError>;

/// Errors that can occur during search operations
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Cannot access {path}: {source}")]
    Access {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid UTF-8 in file {path} at line {line_number}: {source}")]
    EncodingError {
        path: PathBuf,
        line_number: usize,
        source: std::string::FromUtf8Error,
    },
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Worker thread panicked: {0}")]
    WorkerPanicked(String),
}

impl SearchError {
    /// Maps an I/O failure on `path` onto the matching access error
    pub fn from_io(path: impl Into<PathBuf>, err: io::Error) -> Self {
        let path = path.into();
        match err.kind() {
            io::ErrorKind::NotFound => Self::FileNotFound(path),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path),
            _ => Self::Access { path, source: err },
        }
    }

    pub fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound(path.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied(path.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn encoding_error(
        path: impl Into<PathBuf>,
        line_number: usize,
        source: std::string::FromUtf8Error,
    ) -> Self {
        Self::EncodingError {
            path: path.into(),
            line_number,
            source,
        }
    }

    pub fn worker_panicked(stage: impl Into<String>) -> Self {
        Self::WorkerPanicked(stage.into())
    }

    /// Returns true for the per-path errors a stage skips over
    pub fn is_access_error(&self) -> bool {
        matches!(
            self,
            Self::FileNotFound(_)
                | Self::PermissionDenied(_)
                | Self::Access { .. }
                | Self::EncodingError { .. }
        )
    }

    /// The path the error refers to, if any
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::FileNotFound(path)
            | Self::PermissionDenied(path)
            | Self::Access { path, .. }
            | Self::EncodingError { path, .. } => Some(path),
            _ => None,
        }
    }
}
