//! Actor system for watch mode.
//!
//! ```text
//! FsActor --Rebuild--> BundlerActor --Reload--> WsActor
//! (watch)              (compile)               (broadcast)
//! ```
//!
//! - `messages` - Message types for inter-actor communication
//! - `fs` - File system watcher, debouncing and the recompile trigger
//! - `bundler` - Sequential server-entry rebuilds
//! - `ws` - WebSocket reload broadcast
//! - `coordinator` - Wires up and runs actors

pub mod bundler;
pub mod coordinator;
pub mod fs;
pub mod messages;
pub mod ws;

pub use coordinator::Coordinator;
