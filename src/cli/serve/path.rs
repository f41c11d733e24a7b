//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

/// What a URL points at under the serve root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A regular file named by the URL.
    File(PathBuf),
    /// `index.html` of the directory named by the URL.
    Index(PathBuf),
}

impl Resolved {
    pub fn path(&self) -> &Path {
        match self {
            Self::File(path) | Self::Index(path) => path,
        }
    }
}

/// Part of the output that must never be served: the directory holding the
/// server entry, or just the entry file when it sits at the output root.
pub fn server_bundle_path(server_entry: &Path, output: &Path) -> PathBuf {
    match server_entry.parent() {
        Some(dir) if dir != output && dir.starts_with(output) => dir.to_path_buf(),
        _ => server_entry.to_path_buf(),
    }
}

/// Resolve URL to a file under `serve_root`. Paths escaping the root
/// (`..`, symlinks) or pointing into `hidden` resolve to nothing.
pub fn resolve_path(url: &str, serve_root: &Path, hidden: &Path) -> Option<Resolved> {
    let clean = normalize_url(url);
    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    let canonical = serve_root.join(&clean).canonicalize().ok()?;
    let root_canonical = serve_root.canonicalize().ok()?;
    if !canonical.starts_with(&root_canonical) {
        return None;
    }
    if let Ok(hidden) = hidden.canonicalize()
        && canonical.starts_with(&hidden)
    {
        return None;
    }

    if canonical.is_file() {
        return Some(Resolved::File(canonical));
    }
    let index = canonical.join("index.html");
    index.is_file().then_some(Resolved::Index(index))
}

/// Decode, strip query string, trim slashes.
fn normalize_url(url: &str) -> String {
    use percent_encoding::percent_decode_str;

    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_default();
    decoded.trim_matches('/').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("about")).unwrap();
        std::fs::create_dir_all(temp.path().join("assets")).unwrap();
        std::fs::write(temp.path().join("index.html"), "<p>home</p>").unwrap();
        std::fs::write(temp.path().join("about/index.html"), "<p>about</p>").unwrap();
        std::fs::write(temp.path().join("assets/app 1.js"), "run()").unwrap();
        std::fs::create_dir_all(temp.path().join("server")).unwrap();
        std::fs::write(temp.path().join("server/index.mjs"), "export {}").unwrap();
        temp
    }

    fn hidden(temp: &TempDir) -> PathBuf {
        server_bundle_path(&temp.path().join("server/index.mjs"), temp.path())
    }

    #[test]
    fn test_resolve_file_and_index() {
        let temp = site();
        let root = temp.path().canonicalize().unwrap();

        assert_eq!(
            resolve_path("/assets/app%201.js?v=3", temp.path(), &hidden(&temp)),
            Some(Resolved::File(root.join("assets/app 1.js")))
        );
        assert_eq!(
            resolve_path("/about/", temp.path(), &hidden(&temp)),
            Some(Resolved::Index(root.join("about/index.html")))
        );
        assert_eq!(
            resolve_path("/", temp.path(), &hidden(&temp)),
            Some(Resolved::Index(root.join("index.html")))
        );
    }

    #[test]
    fn test_resolve_missing_and_traversal() {
        let temp = site();
        assert_eq!(resolve_path("/nope.js", temp.path(), &hidden(&temp)), None);
        assert_eq!(resolve_path("/assets", temp.path(), &hidden(&temp)), None);
        assert_eq!(resolve_path("/../etc/passwd", temp.path(), &hidden(&temp)), None);
        assert_eq!(resolve_path("/%2e%2e/etc/passwd", temp.path(), &hidden(&temp)), None);
    }

    #[test]
    fn test_server_bundle_is_never_served() {
        let temp = site();
        assert_eq!(resolve_path("/server/index.mjs", temp.path(), &hidden(&temp)), None);
        assert_eq!(resolve_path("/server/", temp.path(), &hidden(&temp)), None);
        assert!(resolve_path("/assets/app%201.js", temp.path(), &hidden(&temp)).is_some());
    }

    #[test]
    fn test_server_bundle_path_at_output_root() {
        let out = Path::new("/app/dist");
        assert_eq!(
            server_bundle_path(&out.join("server/index.mjs"), out),
            PathBuf::from("/app/dist/server")
        );
        assert_eq!(
            server_bundle_path(&out.join("server.mjs"), out),
            PathBuf::from("/app/dist/server.mjs")
        );
    }
}
