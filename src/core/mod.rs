//! Core types - pure abstractions shared across the codebase.

mod driver;
mod mode;
mod state;

pub use driver::BuildMode;
pub use mode::{RenderMode, RouterType};
pub use state::{is_shutdown, register_server, setup_shutdown_handler};
