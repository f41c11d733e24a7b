//! Configuration section definitions.
//!
//! Each module corresponds to a section in `isomer.toml`:
//!
//! | Module   | TOML Section | Purpose                                        |
//! |----------|--------------|------------------------------------------------|
//! | `build`  | `[build]`    | Output paths, server entry, bundler command    |
//! | `render` | `[render]`   | Render mode, server-entry runtime, timeout     |
//! | `router` | `[router]`   | Router type, basename, initial-entry injection |
//! | `serve`  | `[serve]`    | Development server                             |
//! | `watch`  | `[watch]`    | Debounce window and document templates         |

mod build;
mod render;
mod router;
mod serve;
mod watch;

pub use build::BuildSectionConfig;
pub use render::RenderConfig;
pub use router::RouterConfig;
pub use serve::ServeConfig;
pub use watch::{DEFAULT_DOCUMENT_PATTERN, DEFAULT_SOURCE_PATTERN, WatchConfig};
