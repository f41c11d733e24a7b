//! Recompile decisions over a debounced batch of file changes.
//!
//! Pure: no I/O, no global state. The caller acts on the [`Decision`].

use std::path::{Path, PathBuf};

use regex::Regex;

use super::types::{ChangeKind, FileChange};
use crate::config::SiteConfig;
use crate::routes::RouteManifest;
use crate::utils::path::fs::to_slash;

/// Patterns and paths the decision depends on.
#[derive(Debug, Clone)]
pub struct TriggerRules {
    pub pages_dir: PathBuf,
    pub config_path: PathBuf,
    pub documents: Vec<Regex>,
    pub sources: Vec<Regex>,
}

impl TriggerRules {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            pages_dir: config.build.pages.clone(),
            config_path: config.config_path.clone(),
            documents: config.watch.document_patterns(),
            sources: config.watch.source_patterns(),
        }
    }
}

/// What to do about one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decision {
    /// Re-read `isomer.toml` before rebuilding.
    pub reload_config: bool,
    pub rebuild: bool,
    /// Ask open pages to reload after the rebuild.
    pub reload_pages: bool,
    pub reason: String,
}

/// True if any changed path belongs to a page file of the manifest.
///
/// Matches `<pages_dir>/<file>` as a substring of the changed path, so both
/// absolute and project-relative paths qualify.
pub fn relevant<'a>(
    changed: impl IntoIterator<Item = &'a Path>,
    manifest: &RouteManifest,
    pages_dir: &Path,
) -> bool {
    let pages = to_slash(pages_dir);
    let pages = pages.trim_end_matches('/');
    let page_files: Vec<String> = manifest
        .page_files()
        .into_iter()
        .map(|file| format!("{pages}/{}", file.trim_start_matches('/')))
        .collect();
    if page_files.is_empty() {
        return false;
    }

    changed.into_iter().any(|path| {
        let path = to_slash(path);
        page_files.iter().any(|file| path.contains(file.as_str()))
    })
}

pub fn decide(changes: &[FileChange], manifest: &RouteManifest, rules: &TriggerRules) -> Decision {
    let mut decision = Decision::default();
    if changes.is_empty() {
        return decision;
    }

    if changes
        .iter()
        .any(|c| c.kind == ChangeKind::Modified && c.path == rules.config_path)
    {
        decision.reload_config = true;
        decision.rebuild = true;
        decision.reason = "config changed".into();
        return decision;
    }

    // Only content changes: creating or deleting a document is a route change
    // the bundler picks up on its own schedule.
    if let Some(document) = changes.iter().find(|c| {
        c.kind == ChangeKind::Modified && matches_any(&rules.documents, &c.path)
    }) {
        decision.rebuild = true;
        decision.reload_pages = true;
        decision.reason = format!("document {} updated", file_name(&document.path));
        return decision;
    }

    if relevant(changes.iter().map(|c| c.path.as_path()), manifest, &rules.pages_dir) {
        decision.rebuild = true;
        decision.reason = summarize("route", changes);
        return decision;
    }

    let sources: Vec<_> = changes
        .iter()
        .filter(|c| matches_any(&rules.sources, &c.path))
        .cloned()
        .collect();
    if !sources.is_empty() {
        decision.rebuild = true;
        decision.reason = summarize("source", &sources);
    }

    decision
}

fn matches_any(patterns: &[Regex], path: &Path) -> bool {
    let path = to_slash(path);
    patterns.iter().any(|re| re.is_match(&path))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn summarize(what: &str, changes: &[FileChange]) -> String {
    match changes {
        [only] => format!("{what} {} {}", file_name(&only.path), only.kind.label()),
        _ => format!("{} files changed", changes.len()),
    }
}
