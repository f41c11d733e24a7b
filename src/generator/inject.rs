//! Initial-route injection for memory-router apps.
//!
//! A memory router starts at its first entry regardless of the URL, so each
//! route asset gets a bootstrap prefix that tells the app where it is:
//!
//! ```js
//! window.__ISOMER_APP_CONTEXT__=Object.assign({"routePath":"/about"},window.__ISOMER_APP_CONTEXT__||{});
//! ```
//!
//! `Object.assign` copies the existing context last, so keys set by the page
//! itself always win.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::log;

/// Global the bootstrap snippet merges into.
pub const APP_CONTEXT_GLOBAL: &str = "window.__ISOMER_APP_CONTEXT__";

/// `index` for `/`, otherwise the path without its leading slash and with
/// `/` rewritten to `-` (`/blog/archive` -> `blog-archive`).
pub fn route_asset_id(route_path: &str) -> String {
    let trimmed = route_path.trim_matches('/');
    if trimmed.is_empty() {
        "index".to_owned()
    } else {
        trimmed.replace('/', "-")
    }
}

/// `<output>/js/p_<id>.js`
pub fn route_asset_path(output_dir: &Path, route_path: &str) -> PathBuf {
    output_dir
        .join("js")
        .join(format!("p_{}.js", route_asset_id(route_path)))
}

/// Context merged into the app before its own code runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BootstrapPatch {
    pub route_path: String,
}

impl BootstrapPatch {
    pub fn new(route_path: impl Into<String>) -> Self {
        Self {
            route_path: route_path.into(),
        }
    }

    /// Single statement, newline-terminated.
    pub fn snippet(&self) -> String {
        let context = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_owned());
        format!("{APP_CONTEXT_GLOBAL}=Object.assign({context},{APP_CONTEXT_GLOBAL}||{{}});\n")
    }
}

/// Prefix `existing` with the bootstrap snippet. Already-injected content is
/// returned unchanged.
pub fn inject_bootstrap(existing: &str, patch: &BootstrapPatch) -> String {
    let snippet = patch.snippet();
    if existing.starts_with(&snippet) {
        return existing.to_owned();
    }
    let mut out = String::with_capacity(snippet.len() + existing.len());
    out.push_str(&snippet);
    out.push_str(existing);
    out
}

/// Outcome of one injection pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct InjectReport {
    pub injected: usize,
    pub unchanged: usize,
    pub missing: Vec<PathBuf>,
    /// Assets that exist but could not be read or rewritten.
    pub failed: Vec<PathBuf>,
}

/// Inject every route's asset under `output_dir`. Missing and unreadable
/// assets are reported and skipped; the remaining routes are still injected.
pub fn inject_initial_routes(output_dir: &Path, route_paths: &[String]) -> InjectReport {
    let mut report = InjectReport::default();

    for route_path in route_paths {
        let asset = route_asset_path(output_dir, route_path);
        if !asset.is_file() {
            log!("warn"; "no route asset for `{}` at {}", route_path, asset.display());
            report.missing.push(asset);
            continue;
        }

        let existing = match fs::read_to_string(&asset) {
            Ok(existing) => existing,
            Err(e) => {
                log!("warn"; "failed to read {}: {}", asset.display(), e);
                report.failed.push(asset);
                continue;
            }
        };
        let patched = inject_bootstrap(&existing, &BootstrapPatch::new(route_path.as_str()));
        if patched == existing {
            report.unchanged += 1;
            continue;
        }
        if let Err(e) = fs::write(&asset, patched) {
            log!("warn"; "failed to write {}: {}", asset.display(), e);
            report.failed.push(asset);
            continue;
        }
        report.injected += 1;
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_route_asset_id() {
        assert_eq!(route_asset_id("/"), "index");
        assert_eq!(route_asset_id(""), "index");
        assert_eq!(route_asset_id("/about"), "about");
        assert_eq!(route_asset_id("/a/b"), "a-b");
        assert_eq!(route_asset_id("/docs/intro/"), "docs-intro");
    }

    #[test]
    fn test_route_asset_path() {
        assert_eq!(
            route_asset_path(Path::new("/app/dist"), "/a/b"),
            PathBuf::from("/app/dist/js/p_a-b.js")
        );
    }

    #[test]
    fn test_snippet_merges_without_overwriting() {
        let snippet = BootstrapPatch::new("/about").snippet();
        assert_eq!(
            snippet,
            "window.__ISOMER_APP_CONTEXT__=Object.assign({\"routePath\":\"/about\"},window.__ISOMER_APP_CONTEXT__||{});\n"
        );
    }

    #[test]
    fn test_snippet_escapes_route() {
        let snippet = BootstrapPatch::new(r#"/say/"hi""#).snippet();
        assert!(snippet.contains(r#"{"routePath":"/say/\"hi\""}"#));
    }

    #[test]
    fn test_inject_is_idempotent() {
        let patch = BootstrapPatch::new("/");
        let once = inject_bootstrap("console.log(1);", &patch);
        let twice = inject_bootstrap(&once, &patch);

        assert!(once.ends_with("console.log(1);"));
        assert!(once.starts_with(APP_CONTEXT_GLOBAL));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_inject_routes_skips_missing_assets() {
        let temp = TempDir::new().unwrap();
        let js = temp.path().join("js");
        fs::create_dir_all(&js).unwrap();
        fs::write(js.join("p_index.js"), "import './app.js';").unwrap();
        fs::write(js.join("p_a-b.js"), "import './ab.js';").unwrap();

        let routes = vec!["/".to_owned(), "/missing".to_owned(), "/a/b".to_owned()];
        let report = inject_initial_routes(temp.path(), &routes);

        assert_eq!(report.injected, 2);
        assert_eq!(report.missing, vec![js.join("p_missing.js")]);

        let index = fs::read_to_string(js.join("p_index.js")).unwrap();
        assert!(index.starts_with(&BootstrapPatch::new("/").snippet()));

        let again = inject_initial_routes(temp.path(), &routes);
        assert_eq!(again.injected, 0);
        assert_eq!(again.unchanged, 2);
    }

    #[test]
    fn test_unreadable_asset_does_not_stop_other_routes() {
        let temp = TempDir::new().unwrap();
        let js = temp.path().join("js");
        fs::create_dir_all(&js).unwrap();
        fs::write(js.join("p_index.js"), [0xff, 0xfe, 0x00]).unwrap();
        fs::write(js.join("p_about.js"), "run();").unwrap();

        let routes = vec!["/".to_owned(), "/about".to_owned()];
        let report = inject_initial_routes(temp.path(), &routes);

        assert_eq!(report.failed, vec![js.join("p_index.js")]);
        assert_eq!(report.injected, 1);
        let about = fs::read_to_string(js.join("p_about.js")).unwrap();
        assert!(about.starts_with(&BootstrapPatch::new("/about").snippet()));
        assert!(about.ends_with("run();"));
    }
}
