//! `[watch]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [watch]
//! debounce_ms = 200
//! documents = ['src/document(/index)?\.(js|jsx|tsx)$']
//! sources = ['\.(js|jsx|ts|tsx|mjs|cjs)$']
//! paths = ["src", "public"]
//! ```

use std::path::{Path, PathBuf};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::utils::path::normalize_path;

/// Default pattern for the document template.
pub const DEFAULT_DOCUMENT_PATTERN: &str = r"src/document(/index)?\.(js|jsx|tsx)$";

/// Default pattern for modules the server entry is bundled from.
pub const DEFAULT_SOURCE_PATTERN: &str = r"\.(js|jsx|ts|tsx|mjs|cjs)$";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet period before a burst of changes triggers one rebuild.
    pub debounce_ms: u64,

    /// Regexes (matched against `/`-separated paths) of document templates.
    pub documents: Vec<String>,

    /// Regexes of other source files whose changes rebuild the server entry.
    pub sources: Vec<String>,

    /// Directories watched recursively (relative to the project root).
    pub paths: Vec<PathBuf>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 200,
            documents: vec![DEFAULT_DOCUMENT_PATTERN.into()],
            sources: vec![DEFAULT_SOURCE_PATTERN.into()],
            paths: vec!["src".into()],
        }
    }
}

impl WatchConfig {
    pub fn normalize(&mut self, root: &Path) {
        self.paths = self
            .paths
            .iter()
            .map(|p| normalize_path(&root.join(p)))
            .collect();
    }

    /// Compiled document patterns. Invalid ones are reported by `validate`.
    pub fn document_patterns(&self) -> Vec<Regex> {
        compile_patterns(&self.documents)
    }

    pub fn source_patterns(&self) -> Vec<Regex> {
        compile_patterns(&self.sources)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        let lists = [
            (FieldPath::new("watch.documents"), &self.documents),
            (FieldPath::new("watch.sources"), &self.sources),
        ];
        for (field, patterns) in lists {
            for pattern in patterns {
                if let Err(e) = Regex::new(pattern) {
                    diag.error_with_hint(field, format!("invalid pattern `{pattern}`"), e.to_string());
                }
            }
        }
        if self.debounce_ms == 0 {
            diag.warn(
                FieldPath::new("watch.debounce_ms"),
                "0 rebuilds on every single event",
            );
        }
    }
}

fn compile_patterns(patterns: &[String]) -> Vec<Regex> {
    patterns.iter().filter_map(|p| Regex::new(p).ok()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_watch_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.watch.debounce_ms, 200);
        let patterns = config.watch.document_patterns();
        assert_eq!(patterns.len(), 1);
        assert!(patterns[0].is_match("/app/src/document.tsx"));
        assert!(patterns[0].is_match("/app/src/document/index.jsx"));
        assert!(!patterns[0].is_match("/app/src/documents.tsx"));
        assert!(!patterns[0].is_match("/app/src/pages/document.css"));

        let sources = config.watch.source_patterns();
        assert!(sources[0].is_match("/app/src/components/Button.tsx"));
        assert!(!sources[0].is_match("/app/src/styles.css"));
    }

    #[test]
    fn test_watch_invalid_pattern() {
        let config = test_parse_config("[watch]\ndocuments = [\"(unclosed\"]");
        let mut diag = ConfigDiagnostics::new();
        config.watch.validate(&mut diag);
        assert_eq!(diag.len(), 1);
        assert!(config.watch.document_patterns().is_empty());
    }

    #[test]
    fn test_watch_normalize() {
        let mut config = test_parse_config("[watch]\npaths = [\"src\", \"public\"]");
        config.watch.normalize(Path::new("/app"));
        assert_eq!(
            config.watch.paths,
            vec![PathBuf::from("/app/src"), PathBuf::from("/app/public")]
        );
    }
}
