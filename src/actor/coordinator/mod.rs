//! Actor Coordinator - Wires up the Watch-Mode Actor System
//!
//! The Coordinator is a thin orchestrator that:
//! - Creates communication channels
//! - Starts the reload listener
//! - Wires up actors and queues the first build
//! - Runs them until shutdown

mod runtime;

use std::net::IpAddr;
use std::sync::Arc;

use anyhow::Result;
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::bundler::{BundlerActor, ReadyHook};
use super::fs::FsActor;
use super::messages::{BundlerMsg, WsMsg};
use super::ws::WsActor;
use crate::compile::{Bundler, ServerCompileTask};
use crate::routes::ManifestHandle;

const CHANNEL_BUFFER: usize = 32;

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    bundler: Arc<dyn Bundler>,
    task: ServerCompileTask,
    manifest: ManifestHandle,
    watch: bool,
    reload: Option<(IpAddr, u16)>,
    shutdown_rx: Option<Receiver<()>>,
    on_first_ready: Option<ReadyHook>,
}

impl Coordinator {
    pub fn new(bundler: Arc<dyn Bundler>, task: ServerCompileTask, manifest: ManifestHandle) -> Self {
        Self {
            bundler,
            task,
            manifest,
            watch: true,
            reload: None,
            shutdown_rx: None,
            on_first_ready: None,
        }
    }

    /// Disable the file watcher; only the initial build runs.
    pub fn with_watch(mut self, watch: bool) -> Self {
        self.watch = watch;
        self
    }

    /// Start the reload listener on `interface`, near `port`.
    pub fn with_reload(mut self, interface: IpAddr, port: u16) -> Self {
        self.reload = Some((interface, port));
        self
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    pub fn on_first_ready(mut self, hook: ReadyHook) -> Self {
        self.on_first_ready = Some(hook);
        self
    }

    /// Run the actor system.
    pub async fn run(mut self) -> Result<()> {
        let (bundler_tx, bundler_rx) = mpsc::channel::<BundlerMsg>(CHANNEL_BUFFER);
        let (ws_tx, ws_rx) = mpsc::channel::<WsMsg>(CHANNEL_BUFFER);

        let mut bundler = BundlerActor::new(
            bundler_rx,
            Arc::clone(&self.bundler),
            self.task.clone(),
            self.manifest.clone(),
        );
        if let Some(hook) = self.on_first_ready.take() {
            bundler = bundler.on_first_ready(hook);
        }

        let ws = match self.reload {
            Some((interface, port)) => {
                match crate::reload::server::start_ws_server_with_channel(
                    interface,
                    port,
                    ws_tx.clone(),
                ) {
                    Ok(actual_port) => {
                        crate::cli::serve::set_actual_ws_port(actual_port);
                        bundler = bundler.with_ws(ws_tx.clone());
                        Some(WsActor::new(ws_rx))
                    }
                    Err(e) => {
                        crate::log!("warn"; "live reload disabled: {}", e);
                        None
                    }
                }
            }
            None => None,
        };

        // Watch before the first build so edits made during it are not lost.
        let fs = if self.watch {
            let actor = FsActor::new(bundler_tx.clone(), self.manifest.clone())
                .map_err(|e| anyhow::anyhow!("watcher failed: {}", e))?;
            Some(actor)
        } else {
            None
        };

        bundler_tx
            .send(BundlerMsg::Rebuild {
                reason: "startup".to_owned(),
                reload: false,
            })
            .await
            .map_err(|_| anyhow::anyhow!("bundler actor closed before startup"))?;

        crate::debug!("actor"; "start");
        runtime::run_actors(
            runtime::Actors { fs, bundler, ws },
            bundler_tx,
            ws_tx,
            self.shutdown_rx.take(),
        )
        .await;
        crate::debug!("actor"; "stopped");
        Ok(())
    }
}
