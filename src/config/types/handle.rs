//! Global config with atomic reload support.
//!
//! `arc-swap` gives lock-free reads and atomic replacement, so `isomer.toml`
//! can be reloaded while requests are being served.

use crate::config::SiteConfig;
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock};

/// Global config storage.
pub static CONFIG: LazyLock<ArcSwap<SiteConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(SiteConfig::default()));

/// Hash of the config file content currently loaded.
static CONFIG_HASH: AtomicU64 = AtomicU64::new(0);

#[inline]
pub fn cfg() -> Arc<SiteConfig> {
    CONFIG.load_full()
}

/// Reload config from disk if its content changed.
///
/// Returns `Ok(true)` if config was updated, `Ok(false)` if unchanged.
/// A broken file leaves the previous config in place.
pub fn reload_config() -> Result<bool> {
    let c = cfg();
    let cli = c
        .cli
        .context("config was initialized without command-line arguments")?;

    let content = std::fs::read_to_string(&c.config_path)?;
    let new_hash = crate::utils::hash::compute(content.as_bytes());
    if new_hash == CONFIG_HASH.load(Ordering::Relaxed) {
        return Ok(false);
    }

    let mut new_config = SiteConfig::load(cli)?;
    // The output directory is only cleaned once per process.
    new_config.build.clean = false;
    CONFIG.store(Arc::new(new_config));
    CONFIG_HASH.store(new_hash, Ordering::Relaxed);

    Ok(true)
}

pub fn init_config(config: SiteConfig) -> Arc<SiteConfig> {
    if let Ok(content) = std::fs::read_to_string(&config.config_path) {
        CONFIG_HASH.store(
            crate::utils::hash::compute(content.as_bytes()),
            Ordering::Relaxed,
        );
    }

    let arc = Arc::new(config);
    CONFIG.store(Arc::clone(&arc));
    arc
}

/// Clear the clean flag after the initial build.
pub fn clear_clean_flag() {
    let mut config = (*cfg()).clone();
    config.build.clean = false;
    CONFIG.store(Arc::new(config));
}
