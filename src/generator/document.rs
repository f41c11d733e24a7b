//! Build-time document rendering.
//!
//! - document-only builds write a single shell to `<output>/index.html`
//! - statically-generated builds write `<output>/<route>/index.html` for every
//!   static route, in parallel
//!
//! Dynamic routes (`:param`, `*`) cannot be enumerated and are skipped.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Context, Result, anyhow, bail};
use rayon::prelude::*;

use super::inject::{InjectReport, inject_initial_routes};
use crate::config::SiteConfig;
use crate::core::{RenderMode, is_shutdown};
use crate::logger::ProgressLine;
use crate::render::{ModuleLoader, RenderOptions, ServerModule};
use crate::routes::{RouteManifest, is_static_route};
use crate::{debug, log};

/// What one generation pass produced.
#[derive(Debug, Default)]
pub struct GenerateReport {
    pub written: Vec<PathBuf>,
    pub failed: usize,
    pub skipped: Vec<String>,
    pub inject: Option<InjectReport>,
}

pub struct DocumentGenerator {
    output_dir: PathBuf,
    server_entry: PathBuf,
    render_mode: RenderMode,
    inject_initial_entry: bool,
    loader: Arc<dyn ModuleLoader>,
}

impl DocumentGenerator {
    pub fn new(
        output_dir: impl Into<PathBuf>,
        server_entry: impl Into<PathBuf>,
        render_mode: RenderMode,
        loader: Arc<dyn ModuleLoader>,
    ) -> Self {
        Self {
            output_dir: output_dir.into(),
            server_entry: server_entry.into(),
            render_mode,
            inject_initial_entry: false,
            loader,
        }
    }

    pub fn from_config(config: &SiteConfig, loader: Arc<dyn ModuleLoader>) -> Self {
        Self::new(
            &config.build.output,
            &config.build.server_entry,
            config.render.mode,
            loader,
        )
        .with_injection(config.router.should_inject_initial_entry())
    }

    /// Prefix route assets with the initial route (memory routers).
    pub fn with_injection(mut self, enabled: bool) -> Self {
        self.inject_initial_entry = enabled;
        self
    }

    fn options(&self) -> RenderOptions {
        RenderOptions {
            render_mode: self.render_mode,
            document_only: self.render_mode.build_document_only(),
        }
    }

    pub fn generate(&self, manifest: &RouteManifest) -> Result<GenerateReport> {
        let module = self
            .loader
            .load(&self.server_entry)
            .with_context(|| format!("failed to load {}", self.server_entry.display()))?;
        let options = self.options();
        let route_paths = manifest.route_paths();

        let mut report = if options.document_only {
            let path = self.write_document(module.as_ref(), "/", &options)?;
            GenerateReport {
                written: vec![path],
                ..Default::default()
            }
        } else {
            self.generate_routes(module.as_ref(), &route_paths, &options)?
        };

        if self.inject_initial_entry {
            report.inject = Some(inject_initial_routes(&self.output_dir, &route_paths));
        }
        Ok(report)
    }

    fn generate_routes(
        &self,
        module: &dyn ServerModule,
        route_paths: &[String],
        options: &RenderOptions,
    ) -> Result<GenerateReport> {
        let (routes, skipped): (Vec<&String>, Vec<&String>) =
            route_paths.iter().partition(|p| is_static_route(p));
        for route in &skipped {
            log!("warn"; "skipping dynamic route `{}`", route);
        }

        let failed = AtomicUsize::new(0);
        let progress = ProgressLine::new("documents", routes.len());
        let written: Vec<PathBuf> = routes
            .par_iter()
            .filter_map(|route| {
                if is_shutdown() {
                    return None;
                }
                let result = self.write_document(module, route, options);
                progress.inc();
                match result {
                    Ok(path) => Some(path),
                    Err(e) => {
                        failed.fetch_add(1, Ordering::Relaxed);
                        log!("error"; "{}: {:#}", route, e);
                        None
                    }
                }
            })
            .collect();
        progress.finish();

        let failed = failed.into_inner();
        if written.is_empty() && failed > 0 {
            bail!("all {} routes failed to render", failed);
        }
        if failed > 0 {
            log!("warn"; "{} of {} routes failed to render", failed, routes.len());
        }

        Ok(GenerateReport {
            written,
            failed,
            skipped: skipped.into_iter().cloned().collect(),
            inject: None,
        })
    }

    fn write_document(
        &self,
        module: &dyn ServerModule,
        route_path: &str,
        options: &RenderOptions,
    ) -> Result<PathBuf> {
        let response = module.render_document(route_path, options)?;
        if !response.is_success() {
            return Err(anyhow!("server entry answered with status {}", response.status));
        }

        let path = document_path(&self.output_dir, route_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, response.body)
            .with_context(|| format!("failed to write {}", path.display()))?;
        debug!("build"; "wrote {}", path.display());
        Ok(path)
    }
}

/// `/` -> `<output>/index.html`, `/a/b` -> `<output>/a/b/index.html`.
pub fn document_path(output_dir: &Path, route_path: &str) -> PathBuf {
    let trimmed = route_path.trim_matches('/');
    if trimmed.is_empty() {
        output_dir.join("index.html")
    } else {
        output_dir.join(trimmed).join("index.html")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{LoadError, RenderError, RenderResponse, RequestContext};
    use crate::routes::RouteNode;
    use parking_lot::Mutex;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    /// Renders `<h1>{route}</h1>`; fails for routes in `broken`.
    struct FakeModule {
        broken: Vec<&'static str>,
        calls: Mutex<Vec<(String, RenderOptions)>>,
    }

    impl ServerModule for FakeModule {
        fn render_to_response(&self, _: RequestContext, _: &RenderOptions) -> Result<(), RenderError> {
            unreachable!("no live requests at build time")
        }

        fn render_document(
            &self,
            route_path: &str,
            options: &RenderOptions,
        ) -> Result<RenderResponse, RenderError> {
            self.calls.lock().push((route_path.to_owned(), *options));
            let status = if self.broken.contains(&route_path) { 500 } else { 200 };
            Ok(RenderResponse {
                status,
                headers: BTreeMap::new(),
                body: format!("<h1>{route_path}</h1>"),
            })
        }
    }

    struct FakeLoader(Arc<FakeModule>);

    impl ModuleLoader for FakeLoader {
        fn load(&self, _: &Path) -> Result<Arc<dyn ServerModule>, LoadError> {
            Ok(self.0.clone())
        }
    }

    fn manifest() -> RouteManifest {
        RouteManifest::new(vec![
            RouteNode::page("root", "", "layout.tsx").with_children(vec![
                RouteNode::page("index", "", "index.tsx").as_index(),
                RouteNode::page("about", "about", "about.tsx"),
                RouteNode::page("post", "blog/:id", "blog/$id.tsx"),
            ]),
        ])
    }

    fn generator(dir: &TempDir, mode: RenderMode, broken: Vec<&'static str>) -> (DocumentGenerator, Arc<FakeModule>) {
        let module = Arc::new(FakeModule {
            broken,
            calls: Mutex::new(Vec::new()),
        });
        let generator = DocumentGenerator::new(
            dir.path(),
            dir.path().join("server/index.mjs"),
            mode,
            Arc::new(FakeLoader(Arc::clone(&module))),
        );
        (generator, module)
    }

    #[test]
    fn test_document_path() {
        let out = Path::new("/dist");
        assert_eq!(document_path(out, "/"), PathBuf::from("/dist/index.html"));
        assert_eq!(document_path(out, "/a/b"), PathBuf::from("/dist/a/b/index.html"));
    }

    #[test]
    fn test_server_rendered_writes_only_shell() {
        let dir = TempDir::new().unwrap();
        let (generator, module) = generator(&dir, RenderMode::ServerRendered, vec![]);

        let report = generator.generate(&manifest()).unwrap();

        assert_eq!(report.written, vec![dir.path().join("index.html")]);
        assert!(!dir.path().join("about/index.html").exists());
        let calls = module.calls.lock();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1.document_only);
    }

    #[test]
    fn test_statically_generated_writes_every_static_route() {
        let dir = TempDir::new().unwrap();
        let (generator, module) = generator(&dir, RenderMode::StaticallyGenerated, vec![]);

        let report = generator.generate(&manifest()).unwrap();

        assert_eq!(report.written.len(), 2);
        assert_eq!(report.skipped, vec!["/blog/:id".to_owned()]);
        assert_eq!(
            fs::read_to_string(dir.path().join("about/index.html")).unwrap(),
            "<h1>/about</h1>"
        );
        assert!(dir.path().join("index.html").exists());
        assert!(module.calls.lock().iter().all(|(_, o)| !o.document_only));
    }

    #[test]
    fn test_one_failing_route_does_not_abort() {
        let dir = TempDir::new().unwrap();
        let (generator, _) = generator(&dir, RenderMode::StaticallyGenerated, vec!["/about"]);

        let report = generator.generate(&manifest()).unwrap();

        assert_eq!(report.failed, 1);
        assert_eq!(report.written, vec![dir.path().join("index.html")]);
    }

    #[test]
    fn test_all_routes_failing_is_an_error() {
        let dir = TempDir::new().unwrap();
        let (generator, _) = generator(&dir, RenderMode::StaticallyGenerated, vec!["/", "/about"]);

        assert!(generator.generate(&manifest()).is_err());
    }

    #[test]
    fn test_injection_after_generation() {
        let dir = TempDir::new().unwrap();
        let js = dir.path().join("js");
        fs::create_dir_all(&js).unwrap();
        fs::write(js.join("p_about.js"), "run();").unwrap();

        let (generator, _) = generator(&dir, RenderMode::ClientOnly, vec![]);
        let report = generator.with_injection(true).generate(&manifest()).unwrap();

        let inject = report.inject.unwrap();
        assert_eq!(inject.injected, 1);
        // `/` and `/blog/:id` have no asset here
        assert_eq!(inject.missing.len(), 2);
    }
}
