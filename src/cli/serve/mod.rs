//! Development server with server rendering and live reload.
//!
//! ```text
//! tiny_http accept loop (this thread)
//!   └─ one tokio task per request
//!        ├─ /__isomer/reload.js            → reload client
//!        ├─ client file in the output      → static file (server bundle hidden)
//!        └─ RenderDispatcher ─ Next        → index.html / 404
//!                            ─ Rendered    → written by the server entry
//! ```

mod banner;
mod lifecycle;
mod path;
mod response;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use anyhow::{Result, anyhow};
use crossbeam::channel;
use tiny_http::{Request, Server};

use crate::actor::Coordinator;
use crate::compile::{LiveBundler, ServerCompileTask};
use crate::config::{SiteConfig, cfg};
use crate::embed::serve::{RELOAD_SCRIPT_PATH, reload_snippet};
use crate::render::{Dispatch, ModuleLoader, RenderDispatcher, ScriptLoader};
use crate::routes::ManifestHandle;
use crate::utils::path::route::request_path;
use crate::{debug, log};
use path::{Resolved, resolve_path, server_bundle_path};

/// Port the reload listener actually bound; 0 while live reload is off.
static ACTUAL_WS_PORT: AtomicU16 = AtomicU16::new(0);

/// Update the actual WebSocket port (called by coordinator after binding)
pub fn set_actual_ws_port(port: u16) {
    ACTUAL_WS_PORT.store(port, Ordering::Relaxed);
}

fn actual_ws_port() -> Option<u16> {
    match ACTUAL_WS_PORT.load(Ordering::Relaxed) {
        0 => None,
        port => Some(port),
    }
}

/// `isomer serve`
pub fn serve_site(config: &SiteConfig) -> Result<()> {
    crate::cli::build::init_build(config)?;
    bind_server(config)?.run()
}

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
    shutdown_rx: channel::Receiver<()>,
}

/// Bind the HTTP server before any build starts, so early requests wait on
/// the compile task instead of failing to connect.
pub fn bind_server(config: &SiteConfig) -> Result<BoundServer> {
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    lifecycle::register_server_for_shutdown(Arc::clone(&server), shutdown_tx);

    log!("serve"; "http://{}", addr);
    Ok(BoundServer {
        server,
        addr,
        shutdown_rx,
    })
}

impl BoundServer {
    /// Start the actors, then run the request loop until shutdown (blocking).
    pub fn run(self) -> Result<()> {
        let config = cfg();
        let runtime = lifecycle::build_runtime()?;

        let task = ServerCompileTask::new();
        let manifest = ManifestHandle::new(&config.build.manifest);
        // Routes from a previous build answer requests until the first rebuild.
        if manifest.path().is_file()
            && let Err(e) = manifest.reload()
        {
            debug!("serve"; "{}", e);
        }

        let mut loader = ScriptLoader::new(config.render.runtime.clone(), config.get_root());
        if config.serve.watch {
            loader = loader.with_html_snippet(reload_snippet());
        }
        let dispatcher = Arc::new(RenderDispatcher::new(
            task.clone(),
            manifest.clone(),
            Arc::new(loader),
        ));

        let coordinator = self.coordinator(&config, task, manifest);
        let actors = runtime.spawn(async move {
            if let Err(e) = coordinator.run().await {
                log!("error"; "{:#}", e);
            }
        });

        if config.serve.watch {
            let roots: Vec<_> = crate::actor::fs::watched_paths()
                .iter()
                .map(|p| config.root_relative(p).display().to_string())
                .collect();
            debug!("watch"; "watching {}", roots.join(", "));
        }

        for request in self.server.incoming_requests() {
            let dispatcher = Arc::clone(&dispatcher);
            runtime.spawn(async move {
                if let Err(e) = handle_request(request, &dispatcher).await {
                    log!("serve"; "request error: {:#}", e);
                }
            });
        }

        let _ = runtime.block_on(tokio::time::timeout(lifecycle::ACTOR_SHUTDOWN_GRACE, actors));
        runtime.shutdown_timeout(Duration::from_secs(1));
        Ok(())
    }

    fn coordinator(
        &self,
        config: &SiteConfig,
        task: ServerCompileTask,
        manifest: ManifestHandle,
    ) -> Coordinator {
        let mut coordinator = Coordinator::new(Arc::new(LiveBundler), task, manifest.clone())
            .with_watch(config.serve.watch)
            .with_shutdown_signal(self.shutdown_rx.clone());

        if config.serve.watch {
            coordinator = coordinator.with_reload(config.serve.interface, config.serve.reload_port);
        }

        let urls = banner::ServeUrls::new(self.addr);
        coordinator.on_first_ready(Box::new(move || {
            let config = cfg();
            urls.print();
            if config.serve.open {
                banner::open_browser(&urls.local);
            }
            if config.serve.generate {
                generate_after_first_build(&config, &manifest);
            }
        }))
    }
}

fn generate_after_first_build(config: &SiteConfig, manifest: &ManifestHandle) {
    let loader: Arc<dyn ModuleLoader> = Arc::new(ScriptLoader::new(
        config.render.runtime.clone(),
        config.get_root(),
    ));
    if let Err(e) = crate::cli::build::generate_documents(config, loader, &manifest.snapshot()) {
        log!("error"; "document generation failed: {:#}", e);
    }
}

/// Handle a single HTTP request
async fn handle_request(request: Request, dispatcher: &RenderDispatcher) -> Result<()> {
    if crate::core::is_shutdown() {
        return blocking(move || response::respond_unavailable(request)).await;
    }

    if let Some(port) = actual_ws_port()
        && request_path(request.url()) == RELOAD_SCRIPT_PATH
    {
        return blocking(move || response::respond_reload_js(request, port)).await;
    }

    let config = cfg();
    let output = config.build.output.clone();
    let hidden = server_bundle_path(&config.build.server_entry, &output);

    // Bundled client assets are served as-is, whatever the render mode.
    if let Some(Resolved::File(file)) = resolve_path(request.url(), &output, &hidden) {
        return blocking(move || response::respond_file(request, &file, snippet().as_deref()))
            .await;
    }

    match dispatcher.dispatch(request).await {
        Dispatch::Next(request) => {
            blocking(move || respond_static(request, &output, &hidden)).await
        }
        Dispatch::Rendered | Dispatch::Skipped => Ok(()),
    }
}

/// Fallback for requests no route matched.
fn respond_static(request: Request, output: &Path, hidden: &Path) -> Result<()> {
    let snippet = snippet();
    match resolve_path(request.url(), output, hidden) {
        Some(resolved) => response::respond_file(request, resolved.path(), snippet.as_deref()),
        None => response::respond_not_found(request, output, snippet.as_deref()),
    }
}

/// Reload tag for HTML the server sends itself.
fn snippet() -> Option<String> {
    actual_ws_port().map(|_| reload_snippet())
}

async fn blocking<F>(f: F) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| anyhow!("response task failed: {}", e))?
}
