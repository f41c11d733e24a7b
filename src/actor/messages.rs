//! Actor Message Definitions
//!
//! ```text
//! FsActor --BundlerMsg--> BundlerActor --WsMsg--> WsActor
//! ```

// =============================================================================
// BundlerActor Messages
// =============================================================================

/// Messages to the Bundler Actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundlerMsg {
    /// Invalidate the compile task and rebuild the server entry.
    Rebuild {
        reason: String,
        /// Ask open pages to reload once the rebuild succeeded.
        reload: bool,
    },
    Shutdown,
}

// =============================================================================
// WsActor Messages
// =============================================================================

/// Messages to the WebSocket Actor
#[derive(Debug)]
pub enum WsMsg {
    /// Ask every connected page to reload.
    Reload { reason: String },
    /// Raw connection waiting for the WebSocket handshake.
    AddClient(std::net::TcpStream),
    Shutdown,
}
