use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::types::{ChangeKind, FileChange};
use crate::utils::path::normalize_path;

/// Sleep used while nothing is pending.
const IDLE: Duration = Duration::from_secs(86400);

/// Pure debouncer: timing and per-path deduplication only.
///
/// A single window restarts with every accepted event; the batch is released
/// once the window elapses without new events.
pub(super) struct Debouncer {
    pub(super) window: Duration,
    pub(super) changes: FxHashMap<PathBuf, ChangeKind>,
    pub(super) last_event: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new(window: Duration) -> Self {
        Self {
            window,
            changes: FxHashMap::default(),
            last_event: None,
        }
    }

    /// Add a notify event, merging with what is already pending:
    /// - Removed + Created/Modified → Modified (deleted and restored, e.g. atomic save)
    /// - Modified + Removed → Removed
    /// - Created + Removed → dropped (never existed outside the window)
    /// - otherwise the first event wins
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        use notify::EventKind;

        let kind = match event.kind {
            EventKind::Create(_) => ChangeKind::Created,
            EventKind::Remove(_) => ChangeKind::Removed,
            EventKind::Modify(modify) => {
                // mtime/chmod noise would otherwise loop rebuilds
                if matches!(modify, notify::event::ModifyKind::Metadata(_)) {
                    return;
                }
                ChangeKind::Modified
            }
            _ => return,
        };

        for path in &event.paths {
            if is_temp_file(path) {
                continue;
            }
            let path = normalize_path(path);

            match self.changes.get(&path).copied() {
                None => {
                    crate::debug!("watch"; "event {}: {}", kind.label(), path.display());
                    self.changes.insert(path, kind);
                }
                Some(ChangeKind::Removed) if kind != ChangeKind::Removed => {
                    self.changes.insert(path, ChangeKind::Modified);
                }
                Some(ChangeKind::Modified) if kind == ChangeKind::Removed => {
                    self.changes.insert(path, ChangeKind::Removed);
                }
                Some(ChangeKind::Created) if kind == ChangeKind::Removed => {
                    self.changes.remove(&path);
                }
                Some(_) => {}
            }
            self.last_event = Some(Instant::now());
        }
    }

    /// Take the batch once the window has elapsed since the last event.
    pub(super) fn take_if_ready(&mut self) -> Option<Vec<FileChange>> {
        if !self.is_ready() {
            return None;
        }
        self.last_event = None;

        let mut changes: Vec<_> = std::mem::take(&mut self.changes)
            .into_iter()
            .map(|(path, kind)| FileChange::new(path, kind))
            .collect();
        if changes.is_empty() {
            return None;
        }
        changes.sort_by(|a, b| a.path.cmp(&b.path));
        Some(changes)
    }

    pub(super) fn is_ready(&self) -> bool {
        self.last_event
            .is_some_and(|last| last.elapsed() >= self.window)
    }

    /// Time until the pending batch may be released.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return IDLE;
        };
        self.window
            .saturating_sub(last_event.elapsed())
            .max(Duration::from_millis(1))
    }
}

/// Reconcile event kinds with what is on disk now.
///
/// Watchers report stale kinds around atomic saves (Removed for a file that
/// was immediately rewritten).
pub(super) fn correct_by_existence(changes: &mut Vec<FileChange>) {
    changes.retain_mut(|change| {
        let exists = change.path.exists();
        match change.kind {
            ChangeKind::Created if !exists => false,
            ChangeKind::Modified if !exists => {
                change.kind = ChangeKind::Removed;
                true
            }
            ChangeKind::Removed if exists => {
                change.kind = ChangeKind::Modified;
                true
            }
            _ => true,
        }
    });
}

/// Check if path is a temp/backup file (editor artifacts).
pub(super) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
        || name.starts_with("#")
}
