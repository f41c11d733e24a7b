use std::time::Duration;

use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use crate::actor::bundler::BundlerActor;
use crate::actor::fs::FsActor;
use crate::actor::messages::{BundlerMsg, WsMsg};
use crate::actor::ws::WsActor;

const SHUTDOWN_POLL: Duration = Duration::from_millis(100);
const SHUTDOWN_GRACE: Duration = Duration::from_millis(500);

pub(super) struct Actors {
    pub fs: Option<FsActor>,
    pub bundler: BundlerActor,
    pub ws: Option<WsActor>,
}

/// Run all actors concurrently until shutdown is signalled (or, without a
/// signal, until the bundler stops).
pub(super) async fn run_actors(
    actors: Actors,
    bundler_tx: mpsc::Sender<BundlerMsg>,
    ws_tx: mpsc::Sender<WsMsg>,
    shutdown_rx: Option<Receiver<()>>,
) {
    let Actors { fs, bundler, ws } = actors;

    let fs_handle = fs.map(|fs| tokio::spawn(fs.run()));
    let ws_handle = ws.map(|ws| tokio::spawn(ws.run()));
    let mut bundler_handle = tokio::spawn(bundler.run());

    match shutdown_rx {
        Some(rx) => loop {
            if rx.try_recv().is_ok() || crate::core::is_shutdown() {
                crate::debug!("actor"; "shutdown signal received");
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(SHUTDOWN_POLL) => {}
                _ = &mut bundler_handle => return,
            }
        },
        None => {
            let _ = (&mut bundler_handle).await;
            return;
        }
    }

    let _ = bundler_tx.send(BundlerMsg::Shutdown).await;
    let _ = ws_tx.send(WsMsg::Shutdown).await;
    if let Some(fs) = fs_handle {
        fs.abort();
    }

    let _ = tokio::time::timeout(SHUTDOWN_GRACE, bundler_handle).await;
    if let Some(ws) = ws_handle {
        let _ = tokio::time::timeout(SHUTDOWN_GRACE, ws).await;
    }
}
