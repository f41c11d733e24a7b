//! Server-entry compilation.
//!
//! - [`result`]: `CompileResult` / `CompileError`
//! - [`task`]: `ServerCompileTask`, the awaitable, invalidate-able result
//! - [`bundler`]: the external bundler collaborator

mod bundler;
mod result;
mod task;

pub use bundler::{Bundler, CommandBundler, LiveBundler, bundler_vars, resolve_args};
pub use result::{CompileError, CompileResult};
pub use task::{CycleHandle, ServerCompileTask};
