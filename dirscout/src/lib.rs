pub mod config;
pub mod errors;
pub mod filters;
pub mod fs;
pub mod metrics;
pub mod results;
pub mod search;

pub use config::{CliOverrides, EncodingMode, SearchConfig, SearchMode, TraversalMode};
pub use errors::{SearchError, SearchResult};
pub use fs::{FileMetadata, FileSystem, LocalFileSystem};
pub use results::{MatchRecord, MatchSink, MemorySink, SearchSummary};
pub use search::{run_search, run_search_with};
