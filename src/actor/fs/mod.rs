//! FileSystem Actor
//!
//! Watches the source tree and asks the BundlerActor to rebuild.
//! The watcher starts before the first build so no event is lost.
//!
//! ```text
//! Watcher → Debouncer (timing) → trigger::decide (rules) → BundlerMsg
//! ```

use std::path::PathBuf;
use std::time::Duration;

use notify::RecommendedWatcher;
use tokio::sync::mpsc;

use super::messages::BundlerMsg;
use crate::config::cfg;
use crate::routes::ManifestHandle;
use crate::{debug, log};

// Pure timing and deduplication.
mod debouncer;
// Pure recompile decision.
pub mod trigger;
// Shared fs event types.
mod types;
// Watch root attach/re-attach lifecycle.
mod watch_roots;


use debouncer::{Debouncer, correct_by_existence};
use trigger::{Decision, TriggerRules, decide};
pub use types::{ChangeKind, FileChange};
use watch_roots::{WatchRoots, collect_watch_roots};

/// FileSystem Actor - watches for file changes
pub struct FsActor {
    /// notify only offers a sync callback
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Must be kept alive
    watcher: RecommendedWatcher,
    watch_roots: WatchRoots,
    bundler_tx: mpsc::Sender<BundlerMsg>,
    debouncer: Debouncer,
    manifest: ManifestHandle,
}

impl FsActor {
    /// Start watching `[watch] paths` and the project root immediately.
    pub fn new(
        bundler_tx: mpsc::Sender<BundlerMsg>,
        manifest: ManifestHandle,
    ) -> notify::Result<Self> {
        let config = cfg();
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();

        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let mut watch_roots =
            WatchRoots::new(collect_watch_roots(config.get_root(), &config.watch.paths));
        watch_roots.attach_existing(&mut watcher)?;

        Ok(Self {
            notify_rx,
            watcher,
            watch_roots,
            bundler_tx,
            debouncer: Debouncer::new(Duration::from_millis(config.watch.debounce_ms)),
            manifest,
        })
    }

    /// Run the actor event loop
    pub async fn run(self) {
        let notify_rx = self.notify_rx;
        let bundler_tx = self.bundler_tx;
        let manifest = self.manifest;
        let mut debouncer = self.debouncer;
        let mut watcher = self.watcher;
        let mut watch_roots = self.watch_roots;

        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => log!("watch"; "notify error: {}", e),
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                event = async_rx.recv() => match event {
                    Some(event) => debouncer.add_event(&event),
                    None => break,
                },
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    watch_roots.maintain(&mut watcher);
                    if process_changes(&mut debouncer, &bundler_tx, &manifest).await.is_err() {
                        break;
                    }
                }
            }
        }
        debug!("watch"; "stopped");
    }
}

/// Returns `Err(())` once the BundlerActor is gone.
async fn process_changes(
    debouncer: &mut Debouncer,
    bundler_tx: &mpsc::Sender<BundlerMsg>,
    manifest: &ManifestHandle,
) -> Result<(), ()> {
    let Some(mut changes) = debouncer.take_if_ready() else {
        return Ok(());
    };
    correct_by_existence(&mut changes);

    let config = cfg();
    let rules = TriggerRules::from_config(&config);
    let decision = decide(&changes, &manifest.snapshot(), &rules);

    for change in &changes {
        debug!("watch"; "{}: {}", change.kind.label(), config.root_relative(&change.path).display());
    }

    let Some(msg) = act_on(decision) else {
        return Ok(());
    };
    bundler_tx.send(msg).await.map_err(|_| ())
}

/// Apply the config part of a decision and build the bundler message.
fn act_on(decision: Decision) -> Option<BundlerMsg> {
    if decision.reload_config {
        match crate::config::reload_config() {
            Ok(true) => log!("watch"; "config reloaded"),
            Ok(false) => debug!("watch"; "config unchanged"),
            Err(e) => {
                crate::logger::status_error("config reload failed", &format!("{e:#}"));
                return None;
            }
        }
    }

    if !decision.rebuild {
        return None;
    }
    log!("watch"; "{}", decision.reason);
    Some(BundlerMsg::Rebuild {
        reason: decision.reason,
        reload: decision.reload_pages,
    })
}

/// Watch roots for the current config (used by `serve` to report them).
pub fn watched_paths() -> Vec<PathBuf> {
    let config = cfg();
    collect_watch_roots(config.get_root(), &config.watch.paths)
        .into_iter()
        .map(|(path, _)| path)
        .collect()
}
