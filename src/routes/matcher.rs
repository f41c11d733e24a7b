//! Request path matching against the route manifest.
//!
//! Every route (layouts included) becomes a branch: the chain of nodes from
//! the root down to it. Branches are ranked by specificity and the first one
//! whose full pattern matches the path wins, so `/blog/new` prefers a static
//! `blog/new` route over `blog/:id`, and both over `*`.

use std::cmp::Reverse;

use rustc_hash::FxHashMap;

use super::{RouteManifest, RouteNode};
use crate::utils::path::route::strip_basename;

const STATIC_SEGMENT: i32 = 10;
const DYNAMIC_SEGMENT: i32 = 3;
const INDEX_ROUTE: i32 = 2;
const EMPTY_SEGMENT: i32 = 1;
const SPLAT_PENALTY: i32 = -2;

/// One route of a matched branch, outermost first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub route_id: String,
    /// Portion of the request path this route consumed.
    pub pathname: String,
    pub params: FxHashMap<String, String>,
}

struct Branch<'a> {
    pattern: String,
    score: i32,
    chain: Vec<(&'a RouteNode, String)>,
}

/// Match `path` (basename included) against the manifest.
///
/// Returns the matched branch, or an empty list when nothing matches or the
/// path lies outside `basename`.
pub fn match_routes(manifest: &RouteManifest, path: &str, basename: &str) -> Vec<RouteMatch> {
    let Some(path) = strip_basename(path, basename) else {
        return Vec::new();
    };

    let mut branches = Vec::new();
    flatten(manifest.routes(), "/", &mut Vec::new(), &mut branches);
    // Stable: equal scores keep manifest order.
    branches.sort_by_key(|b| Reverse(b.score));

    for branch in &branches {
        if let Some(params) = match_pattern(&branch.pattern, &path) {
            return branch
                .chain
                .iter()
                .map(|(node, pattern)| RouteMatch {
                    route_id: node.id.clone(),
                    pathname: consumed(pattern, &path),
                    params: params.clone(),
                })
                .collect();
        }
    }
    Vec::new()
}

/// True when the route path has no `:param` or `*` segment.
pub fn is_static_route(path: &str) -> bool {
    !path
        .split('/')
        .any(|s| s.starts_with(':') || s == "*")
}

fn flatten<'a>(
    nodes: &'a [RouteNode],
    parent: &str,
    chain: &mut Vec<(&'a RouteNode, String)>,
    out: &mut Vec<Branch<'a>>,
) {
    for node in nodes {
        let pattern = node.full_path(parent);
        chain.push((node, pattern.clone()));
        flatten(&node.children, &pattern, chain, out);
        out.push(Branch {
            score: score(&pattern, node.index),
            pattern,
            chain: chain.clone(),
        });
        chain.pop();
    }
}

fn score(pattern: &str, index: bool) -> i32 {
    let segments: Vec<&str> = pattern.split('/').collect();
    let mut score = i32::try_from(segments.len()).unwrap_or(i32::MAX);
    if segments.contains(&"*") {
        score += SPLAT_PENALTY;
    }
    if index {
        score += INDEX_ROUTE;
    }
    for segment in segments.iter().filter(|s| **s != "*") {
        score += if segment.starts_with(':') {
            DYNAMIC_SEGMENT
        } else if segment.is_empty() {
            EMPTY_SEGMENT
        } else {
            STATIC_SEGMENT
        };
    }
    score
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// Full-path match. Static segments compare case-insensitively.
fn match_pattern(pattern: &str, path: &str) -> Option<FxHashMap<String, String>> {
    let pattern = segments(pattern);
    let path = segments(path);
    let mut params = FxHashMap::default();

    for (i, segment) in pattern.iter().enumerate() {
        if *segment == "*" {
            params.insert("*".to_owned(), path.get(i..).unwrap_or_default().join("/"));
            return Some(params);
        }
        let actual = path.get(i)?;
        if let Some(name) = segment.strip_prefix(':') {
            params.insert(name.to_owned(), (*actual).to_owned());
        } else if !segment.eq_ignore_ascii_case(actual) {
            return None;
        }
    }

    (pattern.len() == path.len()).then_some(params)
}

fn consumed(pattern: &str, path: &str) -> String {
    let pattern = segments(pattern);
    let path = segments(path);
    if pattern.last() == Some(&"*") {
        return format!("/{}", path.join("/"));
    }
    let n = pattern.len().min(path.len());
    format!("/{}", path[..n].join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> RouteManifest {
        RouteManifest::new(vec![
            RouteNode::page("layout", "", "layout.tsx").with_children(vec![
                RouteNode::page("index", "", "index.tsx").as_index(),
                RouteNode::page("about", "about", "about.tsx"),
                RouteNode::page("blog/new", "blog/new", "blog/new.tsx"),
                RouteNode::page("blog/$id", "blog/:id", "blog/$id.tsx"),
                RouteNode::page("$", "*", "$.tsx"),
            ]),
        ])
    }

    fn ids(matches: &[RouteMatch]) -> Vec<&str> {
        matches.iter().map(|m| m.route_id.as_str()).collect()
    }

    #[test]
    fn test_match_index() {
        let matches = match_routes(&manifest(), "/", "/");
        assert_eq!(ids(&matches), vec!["layout", "index"]);
        assert_eq!(matches[1].pathname, "/");
    }

    #[test]
    fn test_static_beats_dynamic() {
        assert_eq!(
            ids(&match_routes(&manifest(), "/blog/new", "/")),
            vec!["layout", "blog/new"]
        );

        let matches = match_routes(&manifest(), "/blog/42", "/");
        assert_eq!(ids(&matches), vec!["layout", "blog/$id"]);
        assert_eq!(matches[1].params.get("id").map(String::as_str), Some("42"));
        assert_eq!(matches[1].pathname, "/blog/42");
        assert_eq!(matches[0].pathname, "/");
    }

    #[test]
    fn test_splat_fallback() {
        let matches = match_routes(&manifest(), "/a/b/c", "/");
        assert_eq!(ids(&matches), vec!["layout", "$"]);
        assert_eq!(matches[1].params.get("*").map(String::as_str), Some("a/b/c"));
    }

    #[test]
    fn test_no_match() {
        let manifest = RouteManifest::new(vec![
            RouteNode::page("index", "", "index.tsx").as_index(),
            RouteNode::page("about", "about", "about.tsx"),
        ]);
        assert!(match_routes(&manifest, "/missing", "/").is_empty());
        assert!(match_routes(&manifest, "/about/deeper", "/").is_empty());
        assert!(match_routes(&RouteManifest::default(), "/", "/").is_empty());
    }

    #[test]
    fn test_basename() {
        let manifest = RouteManifest::new(vec![RouteNode::page("about", "about", "about.tsx")]);
        assert_eq!(ids(&match_routes(&manifest, "/app/about", "/app")), vec!["about"]);
        assert!(match_routes(&manifest, "/about", "/app").is_empty());
    }

    #[test]
    fn test_case_insensitive_static() {
        let manifest = RouteManifest::new(vec![RouteNode::page("about", "about", "about.tsx")]);
        assert_eq!(ids(&match_routes(&manifest, "/About", "/")), vec!["about"]);
    }

    #[test]
    fn test_is_static_route() {
        assert!(is_static_route("/"));
        assert!(is_static_route("/about/team"));
        assert!(!is_static_route("/blog/:id"));
        assert!(!is_static_route("/*"));
    }
}
