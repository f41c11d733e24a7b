//! Request URL handling.
//!
//! Route paths inside isomer always start with `/` and never end with one
//! (except the root itself).

use percent_encoding::percent_decode_str;

/// Extract the decoded path part of a request URL (no query, no fragment).
///
/// ```ignore
/// assert_eq!(request_path("/about?tab=1"), "/about");
/// assert_eq!(request_path("/caf%C3%A9"), "/café");
/// ```
pub fn request_path(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| path.to_string());
    normalize_route(&decoded)
}

/// Collapse duplicate slashes, force a leading slash, drop a trailing one.
pub fn normalize_route(path: &str) -> String {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Strip the router basename from a request path.
///
/// Returns `None` when the path lives outside the basename, in which case no
/// route can match.
pub fn strip_basename(path: &str, basename: &str) -> Option<String> {
    let base = normalize_route(basename);
    if base == "/" {
        return Some(normalize_route(path));
    }

    let path = normalize_route(path);
    let rest = path.strip_prefix(&base)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(normalize_route(rest))
    } else {
        // `/app` must not match `/application`
        None
    }
}

/// Join a parent route path with a child pattern.
pub fn join_route(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        return normalize_route(child);
    }
    normalize_route(&format!("{parent}/{child}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_path() {
        assert_eq!(request_path("/"), "/");
        assert_eq!(request_path("/about?tab=1"), "/about");
        assert_eq!(request_path("/about/#team"), "/about");
        assert_eq!(request_path("//blog//post/"), "/blog/post");
        assert_eq!(request_path("/caf%C3%A9"), "/café");
    }

    #[test]
    fn test_strip_basename() {
        assert_eq!(strip_basename("/about", "/").as_deref(), Some("/about"));
        assert_eq!(strip_basename("/app/about", "/app").as_deref(), Some("/about"));
        assert_eq!(strip_basename("/app", "/app/").as_deref(), Some("/"));
        assert_eq!(strip_basename("/application", "/app"), None);
        assert_eq!(strip_basename("/other", "/app"), None);
    }

    #[test]
    fn test_join_route() {
        assert_eq!(join_route("/", ""), "/");
        assert_eq!(join_route("/", "about"), "/about");
        assert_eq!(join_route("/blog", ":id"), "/blog/:id");
        assert_eq!(join_route("/blog", "/abs"), "/abs");
    }
}
