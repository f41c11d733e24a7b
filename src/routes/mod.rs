//! Route manifest: the route table written by the bundler.
//!
//! The manifest is read-only here. It is loaded from `[build] manifest`,
//! published through an `ArcSwap` handle and replaced wholesale after every
//! rebuild.
//!
//! - [`manifest`]: `RouteNode` tree, loading, flattening
//! - [`matcher`]: request path -> matched branch
//! - [`store`]: the shared `ManifestHandle`

mod manifest;
mod matcher;
mod store;

pub use manifest::{ManifestError, RouteManifest, RouteNode};
pub use matcher::{RouteMatch, is_static_route, match_routes};
pub use store::ManifestHandle;
