//! Production build orchestration.
//!
//! Build pipeline phases:
//! - **Init** - Clean the output directory when `--clean` is set
//! - **Compile** - One bundler run, result fixed for the whole build
//! - **Routes** - Load the route manifest written by the bundler
//! - **Generate** - Document shell or per-route HTML, route-asset injection

use std::fs;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};

use crate::compile::{Bundler, CommandBundler, ServerCompileTask};
use crate::config::SiteConfig;
use crate::core::BuildMode;
use crate::generator::{DocumentGenerator, GenerateReport};
use crate::render::{ModuleLoader, ScriptLoader};
use crate::routes::RouteManifest;
use crate::{debug, log};

/// `isomer build`
pub fn build_site(config: &SiteConfig) -> Result<()> {
    let started = Instant::now();
    init_build(config)?;

    log!("build"; "bundling ({})", config.render.mode.as_str());
    let task = ServerCompileTask::resolved(
        CommandBundler::from_config(config).build(BuildMode::Production),
    );
    let result = task.peek().context("compile task has no result")?;
    if let Some(error) = result.error() {
        let detail = error.detail();
        if !detail.is_empty() {
            eprintln!("{detail}");
        }
        bail!("build failed: {error}");
    }

    let manifest = RouteManifest::load(&config.build.manifest)?;
    debug!("build"; "{} routes in manifest", manifest.route_paths().len());

    let loader = Arc::new(ScriptLoader::new(
        config.render.runtime.clone(),
        config.get_root(),
    ));
    generate_documents(config, loader, &manifest)?;

    log!("build"; "done in {}ms", started.elapsed().as_millis());
    Ok(())
}

/// Remove the output directory when `--clean` is set.
pub fn init_build(config: &SiteConfig) -> Result<()> {
    let output = &config.build.output;
    if config.build.clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("failed to clean {}", output.display()))?;
        log!("build"; "cleaned {}", config.root_relative(output).display());
    }
    crate::config::clear_clean_flag();
    Ok(())
}

/// Render documents for `manifest` and report what was written.
pub fn generate_documents(
    config: &SiteConfig,
    loader: Arc<dyn ModuleLoader>,
    manifest: &RouteManifest,
) -> Result<GenerateReport> {
    let report = DocumentGenerator::from_config(config, loader).generate(manifest)?;

    log!("build"; "{} written", plural(report.written.len(), "document"));
    if !report.skipped.is_empty() {
        debug!("build"; "skipped dynamic routes: {}", report.skipped.join(", "));
    }
    if let Some(inject) = &report.inject {
        log!("build"; "initial route injected into {}", plural(inject.injected, "asset"));
        if !inject.failed.is_empty() {
            log!("warn"; "{} could not be injected", plural(inject.failed.len(), "route asset"));
        }
    }
    Ok(report)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
