//! Live reload for the dev server.
//!
//! ```text
//! BundlerActor --WsMsg::Reload--> WsActor --ReloadMessage--> Browser
//! ```
//!
//! - `message` - JSON frames sent to the browser
//! - `server` - WebSocket listener feeding connections to the WsActor

pub mod message;
pub mod server;
