use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

/// Keeps the configured roots attached to the watcher.
///
/// Roots missing at startup (or deleted and recreated later) are attached
/// as soon as they exist.
pub(super) struct WatchRoots {
    desired: Vec<(PathBuf, RecursiveMode)>,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    pub(super) fn new(paths: Vec<(PathBuf, RecursiveMode)>) -> Self {
        Self {
            desired: paths,
            attached: FxHashSet::default(),
        }
    }

    pub(super) fn attach_existing(
        &mut self,
        watcher: &mut RecommendedWatcher,
    ) -> notify::Result<()> {
        for (path, mode) in &self.desired {
            if !path.exists() {
                crate::debug!("watch"; "not watching missing {}", path.display());
                continue;
            }
            watcher.watch(path, *mode)?;
            self.attached.insert(path.clone());
        }
        Ok(())
    }

    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) {
        self.attached.retain(|path| path.exists());

        for (path, mode) in &self.desired {
            if self.attached.contains(path) || !path.exists() {
                continue;
            }
            if watcher.watch(path, *mode).is_ok() {
                self.attached.insert(path.clone());
                crate::debug!("watch"; "re-attached watch: {}", path.display());
            }
        }
    }
}

/// `[watch] paths` recursively, plus the project root itself (not
/// recursively) so `isomer.toml` survives atomic saves.
pub(super) fn collect_watch_roots(
    root: &std::path::Path,
    paths: &[PathBuf],
) -> Vec<(PathBuf, RecursiveMode)> {
    let mut roots: Vec<(PathBuf, RecursiveMode)> = paths
        .iter()
        .map(|p| (p.clone(), RecursiveMode::Recursive))
        .collect();
    if !paths.iter().any(|p| p == root) {
        roots.push((root.to_path_buf(), RecursiveMode::NonRecursive));
    }
    roots
}
