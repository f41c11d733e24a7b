//! Shared handle to the latest route manifest.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;

use super::{ManifestError, RouteManifest};
use crate::debug;

/// Cheap-to-clone handle; readers always see a complete snapshot.
#[derive(Clone)]
pub struct ManifestHandle {
    path: PathBuf,
    current: Arc<ArcSwap<RouteManifest>>,
}

impl ManifestHandle {
    /// Handle for the manifest file at `path`, starting empty.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: Arc::new(ArcSwap::from_pointee(RouteManifest::default())),
        }
    }

    /// Handle holding a fixed manifest (build-time tooling and tests).
    pub fn from_manifest(manifest: RouteManifest) -> Self {
        Self {
            path: PathBuf::new(),
            current: Arc::new(ArcSwap::from_pointee(manifest)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Arc<RouteManifest> {
        self.current.load_full()
    }

    pub fn replace(&self, manifest: RouteManifest) {
        self.current.store(Arc::new(manifest));
    }

    /// Re-read the manifest file. On error the previous snapshot stays.
    pub fn reload(&self) -> Result<Arc<RouteManifest>, ManifestError> {
        let manifest = Arc::new(RouteManifest::load(&self.path)?);
        debug!("routes"; "loaded {} route(s) from {}", manifest.route_paths().len(), self.path.display());
        self.current.store(Arc::clone(&manifest));
        Ok(manifest)
    }
}
