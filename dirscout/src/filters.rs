/// Path filtering for the discoverer and enumerator stages.
///
/// Ignore patterns use glob syntax and are matched against the whole path with
/// `\` normalised to `/`, so `**/target` skips every `target` directory and
/// `**/*.min.js` skips minified scripts anywhere in the tree. A directory that
/// matches is never listed, which prunes its whole subtree.
use glob::Pattern;
use std::path::Path;

use crate::errors::{SearchError, SearchResult};

/// Compiled set of ignore patterns
#[derive(Debug, Clone, Default)]
pub struct IgnoreFilter {
    patterns: Vec<Pattern>,
}

impl IgnoreFilter {
    /// Compiles the given glob patterns, failing on the first invalid one
    pub fn new(patterns: &[String]) -> SearchResult<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|e| {
                    SearchError::config_error(format!("Invalid ignore pattern '{}': {}", p, e))
                })
            })
            .collect::<SearchResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Checks if a path matches any ignore pattern
    pub fn is_ignored(&self, path: &Path) -> bool {
        if self.patterns.is_empty() {
            return false;
        }
        let normalized_path = path.to_string_lossy().replace('\\', "/");
        self.patterns.iter().any(|p| p.matches(&normalized_path))
    }
}
