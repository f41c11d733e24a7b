//! Request-time rendering through the compiled server entry.
//!
//! - [`module`]: `ServerModule` / `ModuleLoader` seams and their errors
//! - [`cache`]: path -> loaded module, evicted before every load
//! - [`script`]: default loader running the entry with a JS runtime
//! - [`dispatcher`]: per-request middleware

mod cache;
mod dispatcher;
mod module;
mod script;

pub use cache::ModuleCache;
pub use dispatcher::{Dispatch, DispatchSettings, RenderDispatcher};
pub use module::{
    LoadError, ModuleLoader, RenderError, RenderOptions, RenderResponse, RequestContext,
    ServerModule,
};
pub use script::{ScriptLoader, ScriptModule};
pub(crate) use script::append_to_body;
