//! Post-build output: HTML documents and route-asset injection.
//!
//! - **document**: renders the document shell or every static route
//! - **inject**: prefixes route assets with the initial route for memory routers

pub mod document;
pub mod inject;

pub use document::{DocumentGenerator, GenerateReport, document_path};
pub use inject::{BootstrapPatch, InjectReport, inject_bootstrap, inject_initial_routes, route_asset_path};
