//! Route manifest model.
//!
//! ```json
//! [
//!   { "id": "layout", "path": "", "file": "layout.tsx", "children": [
//!     { "id": "index", "path": "", "file": "index.tsx", "index": true },
//!     { "id": "about", "path": "about", "file": "about.tsx" },
//!     { "id": "blog/$id", "path": "blog/:id", "file": "blog/$id.tsx" }
//!   ]}
//! ]
//! ```

use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::path::route::join_route;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read route manifest `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("malformed route manifest `{0}`")]
    Json(PathBuf, #[source] serde_json::Error),
}

/// One route definition. `path` is relative to the parent route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteNode {
    pub id: String,

    #[serde(default)]
    pub path: String,

    /// Page file relative to the pages directory (`blog/$id.tsx`).
    #[serde(default)]
    pub file: String,

    /// Index route: renders at its parent's path.
    #[serde(default)]
    pub index: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteNode>,
}

impl RouteNode {
    /// Leaf page with no children.
    pub fn page(id: &str, path: &str, file: &str) -> Self {
        Self {
            id: id.to_owned(),
            path: path.to_owned(),
            file: file.to_owned(),
            index: false,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<RouteNode>) -> Self {
        self.children = children;
        self
    }

    pub fn as_index(mut self) -> Self {
        self.index = true;
        self
    }

    /// Pattern of this node joined onto its parent's.
    pub(crate) fn full_path(&self, parent: &str) -> String {
        if self.index {
            join_route(parent, "")
        } else {
            join_route(parent, &self.path)
        }
    }
}

/// Immutable snapshot of the route table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteManifest {
    routes: Vec<RouteNode>,
}

impl RouteManifest {
    pub fn new(routes: Vec<RouteNode>) -> Self {
        Self { routes }
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ManifestError::Io(path.to_path_buf(), e))?;
        Self::from_json(&content).map_err(|e| ManifestError::Json(path.to_path_buf(), e))
    }

    pub fn from_json(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content).map(Self::new)
    }

    pub fn routes(&self) -> &[RouteNode] {
        &self.routes
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Every page file in the tree, parents before children.
    pub fn page_files(&self) -> Vec<&str> {
        fn walk<'a>(nodes: &'a [RouteNode], out: &mut Vec<&'a str>) {
            for node in nodes {
                if !node.file.is_empty() {
                    out.push(&node.file);
                }
                walk(&node.children, out);
            }
        }

        let mut files = Vec::new();
        walk(&self.routes, &mut files);
        files
    }

    /// Full paths of every renderable route, in manifest order, deduplicated.
    ///
    /// Layout routes (routes with children) only count when none of their
    /// children renders at the layout's own path.
    pub fn route_paths(&self) -> Vec<String> {
        fn walk(nodes: &[RouteNode], parent: &str, out: &mut Vec<String>) {
            for node in nodes {
                let full = node.full_path(parent);
                if node.children.is_empty() {
                    out.push(full);
                } else {
                    walk(&node.children, &full, out);
                    if !out.contains(&full) {
                        out.push(full);
                    }
                }
            }
        }

        let mut paths = Vec::new();
        walk(&self.routes, "/", &mut paths);

        let mut seen = FxHashSet::default();
        paths.retain(|p| seen.insert(p.clone()));
        paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn nested() -> RouteManifest {
        RouteManifest::new(vec![
            RouteNode::page("layout", "", "layout.tsx").with_children(vec![
                RouteNode::page("index", "", "index.tsx").as_index(),
                RouteNode::page("about", "about", "about.tsx"),
                RouteNode::page("blog", "blog", "blog/layout.tsx").with_children(vec![
                    RouteNode::page("blog/index", "", "blog/index.tsx").as_index(),
                    RouteNode::page("blog/$id", ":id", "blog/$id.tsx"),
                ]),
            ]),
        ])
    }

    #[test]
    fn test_from_json() {
        let manifest = RouteManifest::from_json(
            r#"[{"id":"about","path":"about","file":"about.tsx"},{"id":"x","path":"*"}]"#,
        )
        .unwrap();
        assert_eq!(manifest.routes().len(), 2);
        assert_eq!(manifest.routes()[0].file, "about.tsx");
        assert!(manifest.routes()[1].file.is_empty());
        assert!(!manifest.routes()[1].index);
    }

    #[test]
    fn test_page_files() {
        assert_eq!(
            nested().page_files(),
            vec![
                "layout.tsx",
                "index.tsx",
                "about.tsx",
                "blog/layout.tsx",
                "blog/index.tsx",
                "blog/$id.tsx"
            ]
        );
    }

    #[test]
    fn test_route_paths() {
        assert_eq!(
            nested().route_paths(),
            vec!["/", "/about", "/blog", "/blog/:id"]
        );
    }

    #[test]
    fn test_layout_without_index_is_listed() {
        let manifest = RouteManifest::new(vec![
            RouteNode::page("docs", "docs", "docs.tsx")
                .with_children(vec![RouteNode::page("docs/intro", "intro", "docs/intro.tsx")]),
        ]);
        assert_eq!(manifest.route_paths(), vec!["/docs/intro", "/docs"]);
    }

    #[test]
    fn test_load_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            RouteManifest::load(&missing),
            Err(ManifestError::Io(..))
        ));

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{ not json").unwrap();
        assert!(matches!(
            RouteManifest::load(&broken),
            Err(ManifestError::Json(..))
        ));
    }
}
