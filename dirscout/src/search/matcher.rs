use std::path::Path;

use crate::config::SearchMode;

/// Plain, case-sensitive substring matching for both search modes
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    query: String,
    mode: SearchMode,
}

impl QueryMatcher {
    pub fn new(query: impl Into<String>, mode: SearchMode) -> Self {
        Self {
            query: query.into(),
            mode,
        }
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Checks the file's base name, ignoring its directory
    pub fn matches_name(&self, path: &Path) -> bool {
        path.file_name()
            .map(|name| name.to_string_lossy().contains(self.query.as_str()))
            .unwrap_or(false)
    }

    pub fn matches_line(&self, line: &str) -> bool {
        line.contains(self.query.as_str())
    }
}
