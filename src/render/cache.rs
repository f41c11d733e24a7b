//! Loaded server modules keyed by entry path.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use super::{LoadError, ModuleLoader, ServerModule};
use crate::debug;

/// Explicit entry path -> module mapping.
///
/// The entry file is rewritten by every rebuild, so a request never trusts a
/// cached module: `reload` evicts first and loads fresh.
#[derive(Default)]
pub struct ModuleCache {
    modules: DashMap<PathBuf, Arc<dyn ServerModule>>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entry: &Path) -> Option<Arc<dyn ServerModule>> {
        self.modules.get(entry).map(|m| Arc::clone(m.value()))
    }

    /// Returns whether a module was cached.
    pub fn evict(&self, entry: &Path) -> bool {
        self.modules.remove(entry).is_some()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Evict `entry`, load it again and cache the new module.
    pub fn reload(
        &self,
        entry: &Path,
        loader: &dyn ModuleLoader,
    ) -> Result<Arc<dyn ServerModule>, LoadError> {
        if self.evict(entry) {
            debug!("render"; "evicted {}", entry.display());
        }
        let module = loader.load(entry)?;
        self.modules.insert(entry.to_path_buf(), Arc::clone(&module));
        Ok(module)
    }
}
