//! Reload message protocol (server → browser, JSON text frames).
//!
//! ```json
//! {"type":"connected","version":"0.1.0"}
//! {"type":"reload","reason":"document document.tsx updated"}
//! ```

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ReloadMessage {
    /// Sent once after the handshake.
    Connected { version: String },
    /// Reload the whole page.
    Reload { reason: String },
}

impl ReloadMessage {
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }

    pub fn reload(reason: impl Into<String>) -> Self {
        Self::Reload {
            reason: reason.into(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
