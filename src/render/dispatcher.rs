//! Per-request render middleware.
//!
//! ```text
//! request ─► match routes ─┬─ no match (and not document-only) ─► Next(request)
//!                          └─ await compile ─┬─ Failed ─► log, Skipped
//!                                            └─ Ready ─► evict + load ─► render ─► Rendered
//! ```

use std::sync::{Arc, Once};
use std::time::Duration;

use tiny_http::Request;

use super::{LoadError, ModuleCache, ModuleLoader, RenderError, RenderOptions, RequestContext};
use crate::compile::{CompileResult, ServerCompileTask};
use crate::config::SiteConfig;
use crate::core::{RenderMode, RouterType};
use crate::routes::{ManifestHandle, match_routes};
use crate::utils::path::route::request_path;
use crate::{debug, log};

static HASH_ROUTER_WARNING: Once = Once::new();

/// Outcome of dispatching one request.
pub enum Dispatch {
    /// No route matched; the caller handles the request.
    Next(Request),
    /// The server module wrote the response.
    Rendered,
    /// Handling ended without a response (error already logged).
    Skipped,
}

impl std::fmt::Debug for Dispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Next(request) => write!(f, "Next({})", request.url()),
            Self::Rendered => f.write_str("Rendered"),
            Self::Skipped => f.write_str("Skipped"),
        }
    }
}

/// Render-related settings read for every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchSettings {
    pub render_mode: RenderMode,
    pub router_type: RouterType,
    pub basename: String,
    /// `Duration::ZERO` waits for the compile result forever.
    pub compile_timeout: Duration,
}

impl DispatchSettings {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            render_mode: config.render.mode,
            router_type: config.router.router_type,
            basename: config.router.basename.clone(),
            compile_timeout: config.render.compile_timeout().unwrap_or(Duration::ZERO),
        }
    }
}

enum Settings {
    /// Follow the live, reloadable config.
    Live,
    Fixed(DispatchSettings),
}

enum Fault {
    Load(LoadError),
    Render(RenderError),
}

pub struct RenderDispatcher {
    task: ServerCompileTask,
    manifest: ManifestHandle,
    cache: Arc<ModuleCache>,
    loader: Arc<dyn ModuleLoader>,
    settings: Settings,
}

impl RenderDispatcher {
    /// Dispatcher following `cfg()`, so config reloads apply to the next request.
    pub fn new(
        task: ServerCompileTask,
        manifest: ManifestHandle,
        loader: Arc<dyn ModuleLoader>,
    ) -> Self {
        Self {
            task,
            manifest,
            cache: Arc::new(ModuleCache::new()),
            loader,
            settings: Settings::Live,
        }
    }

    pub fn with_settings(mut self, settings: DispatchSettings) -> Self {
        self.settings = Settings::Fixed(settings);
        self
    }

    fn settings(&self) -> DispatchSettings {
        match &self.settings {
            Settings::Live => DispatchSettings::from_config(&crate::config::cfg()),
            Settings::Fixed(settings) => settings.clone(),
        }
    }

    pub async fn dispatch(&self, request: Request) -> Dispatch {
        let settings = self.settings();
        let path = request_path(request.url());
        let document_only = settings.render_mode.request_document_only();

        let manifest = self.manifest.snapshot();
        let matches = match_routes(&manifest, &path, &settings.basename);
        if matches.is_empty() && !document_only {
            return Dispatch::Next(request);
        }

        warn_hash_router(&settings);

        let result = self.task.get_timeout(settings.compile_timeout).await;
        let entry = match &*result {
            CompileResult::Ready { server_entry } => server_entry.clone(),
            CompileResult::Failed { error } => {
                log!("error"; "cannot render {}: {}", path, error);
                if !error.detail().is_empty() {
                    debug!("error"; "{}", error.detail());
                }
                return Dispatch::Skipped;
            }
        };

        let options = RenderOptions {
            render_mode: settings.render_mode,
            document_only,
        };
        let cache = Arc::clone(&self.cache);
        let loader = Arc::clone(&self.loader);
        let load_entry = entry.clone();

        let outcome = tokio::task::spawn_blocking(move || {
            let module = cache
                .reload(&load_entry, loader.as_ref())
                .map_err(Fault::Load)?;
            module
                .render_to_response(RequestContext::new(request), &options)
                .map_err(Fault::Render)
        })
        .await;

        match outcome {
            Ok(Ok(())) => {
                debug!("render"; "{} ({} route(s))", path, matches.len());
                Dispatch::Rendered
            }
            Ok(Err(Fault::Load(e))) => {
                log!("error"; "failed to load {} for {}: {}", entry.display(), path, e);
                Dispatch::Skipped
            }
            Ok(Err(Fault::Render(e))) => {
                log!("error"; "failed to render {}: {}", path, e);
                Dispatch::Skipped
            }
            Err(e) => {
                log!("error"; "render task for {} aborted: {}", path, e);
                Dispatch::Skipped
            }
        }
    }
}

fn warn_hash_router(settings: &DispatchSettings) {
    if settings.router_type == RouterType::Hash && settings.render_mode != RenderMode::ClientOnly {
        HASH_ROUTER_WARNING.call_once(|| {
            log!("warn"; "hash router: the server never sees the #fragment, pages render as `/`; consider `mode = \"client-only\"`");
        });
    }
}
