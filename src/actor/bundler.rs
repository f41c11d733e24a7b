//! Bundler Actor - Sequential Server-Entry Rebuilds
//!
//! Owns the write side of the [`ServerCompileTask`]. Every `Rebuild`
//! invalidates the task at once, so requests arriving mid-build wait for
//! the newest server entry instead of rendering a stale one.
//!
//! Builds never overlap. Changes that arrive while a build is running are
//! folded into exactly one follow-up build.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};

use super::messages::{BundlerMsg, WsMsg};
use crate::compile::{Bundler, CompileError, CompileResult, CycleHandle, ServerCompileTask};
use crate::core::BuildMode;
use crate::routes::ManifestHandle;
use crate::{debug, log};

/// Runs once, after the first successful build.
pub type ReadyHook = Box<dyn FnOnce() + Send + 'static>;

/// Build currently on the blocking pool.
struct Running {
    cycle: CycleHandle,
    reason: String,
    reload: bool,
    started: Instant,
    join: JoinHandle<CompileResult>,
}

/// Rebuild requested while another build was running.
struct Queued {
    cycle: CycleHandle,
    reason: String,
    reload: bool,
}

pub struct BundlerActor {
    rx: mpsc::Receiver<BundlerMsg>,
    ws_tx: Option<mpsc::Sender<WsMsg>>,
    bundler: Arc<dyn Bundler>,
    task: ServerCompileTask,
    manifest: ManifestHandle,
    on_first_ready: Option<ReadyHook>,
}

impl BundlerActor {
    pub fn new(
        rx: mpsc::Receiver<BundlerMsg>,
        bundler: Arc<dyn Bundler>,
        task: ServerCompileTask,
        manifest: ManifestHandle,
    ) -> Self {
        Self {
            rx,
            ws_tx: None,
            bundler,
            task,
            manifest,
            on_first_ready: None,
        }
    }

    pub fn with_ws(mut self, ws_tx: mpsc::Sender<WsMsg>) -> Self {
        self.ws_tx = Some(ws_tx);
        self
    }

    pub fn on_first_ready(mut self, hook: ReadyHook) -> Self {
        self.on_first_ready = Some(hook);
        self
    }

    /// Main event loop
    pub async fn run(mut self) {
        let mut running: Option<Running> = None;
        let mut queued: Option<Queued> = None;

        loop {
            tokio::select! {
                biased;

                msg = self.rx.recv() => match msg {
                    Some(BundlerMsg::Rebuild { reason, reload }) => {
                        let cycle = self.task.invalidate();
                        if running.is_some() {
                            debug!("bundler"; "queued rebuild #{}: {}", cycle.generation(), reason);
                            queued = Some(merge(queued, cycle, reason, reload));
                        } else {
                            running = Some(self.start(cycle, reason, reload));
                        }
                    }
                    Some(BundlerMsg::Shutdown) | None => break,
                },

                joined = wait_build(&mut running) => {
                    if let Some(done) = running.take() {
                        self.finish(done, joined).await;
                    }
                    if let Some(next) = queued.take() {
                        running = Some(self.start(next.cycle, next.reason, next.reload));
                    }
                }
            }
        }

        if let Some(done) = running.take() {
            done.join.abort();
        }
        debug!("bundler"; "stopped");
    }

    fn start(&self, cycle: CycleHandle, reason: String, reload: bool) -> Running {
        debug!("bundler"; "build #{} ({})", cycle.generation(), reason);
        let bundler = Arc::clone(&self.bundler);
        Running {
            cycle,
            reason,
            reload,
            started: Instant::now(),
            join: tokio::task::spawn_blocking(move || bundler.build(BuildMode::Development)),
        }
    }

    async fn finish(&mut self, done: Running, joined: Result<CompileResult, JoinError>) {
        let result = joined
            .unwrap_or_else(|e| CompileResult::failed(CompileError::Aborted(e.to_string())));
        let elapsed = done.started.elapsed();

        // Routes must be current before any waiting request wakes up.
        if result.is_ready()
            && let Err(e) = self.manifest.reload()
        {
            log!("warn"; "{}, keeping previous routes", e);
        }
        let result = done.cycle.resolve(result);

        if let Some(error) = result.error() {
            crate::logger::status_error(&format!("build failed: {error}"), error.detail());
            return;
        }

        crate::logger::status_success(&format!(
            "rebuilt server entry ({}) in {}ms",
            done.reason,
            elapsed.as_millis()
        ));

        if done.reload
            && let Some(ws_tx) = &self.ws_tx
        {
            let _ = ws_tx.send(WsMsg::Reload { reason: done.reason }).await;
        }

        if let Some(hook) = self.on_first_ready.take() {
            let _ = tokio::task::spawn_blocking(hook).await;
        }
    }
}

/// Keep the newest cycle; older queued cycles stay pending until it resolves.
fn merge(prev: Option<Queued>, cycle: CycleHandle, reason: String, reload: bool) -> Queued {
    match prev {
        Some(prev) => Queued {
            cycle,
            reason: if prev.reason == reason {
                reason
            } else {
                "multiple changes".to_owned()
            },
            reload: prev.reload || reload,
        },
        None => Queued {
            cycle,
            reason,
            reload,
        },
    }
}

/// Wait for the running build (pending forever if none).
async fn wait_build(running: &mut Option<Running>) -> Result<CompileResult, JoinError> {
    match running.as_mut() {
        Some(running) => (&mut running.join).await,
        None => std::future::pending().await,
    }
}
