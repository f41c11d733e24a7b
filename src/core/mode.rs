//! Render mode and router type.
//!
//! Both are fixed per build and read from `[render] mode` / `[router] type`.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// How HTML is produced for a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum RenderMode {
    /// Rendered per request by the server entry.
    #[default]
    ServerRendered,
    /// Rendered once per route at build time.
    StaticallyGenerated,
    /// Only the document shell is rendered; the client renders the page.
    ClientOnly,
}

impl RenderMode {
    /// Document-only flag for live requests.
    ///
    /// A client-only app answers every path with the document shell, so
    /// unmatched paths still render instead of falling through.
    pub const fn request_document_only(self) -> bool {
        matches!(self, Self::ClientOnly)
    }

    /// Document-only flag for build-time generation.
    ///
    /// Only statically-generated builds render full per-route pages.
    pub const fn build_document_only(self) -> bool {
        !matches!(self, Self::StaticallyGenerated)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServerRendered => "server-rendered",
            Self::StaticallyGenerated => "statically-generated",
            Self::ClientOnly => "client-only",
        }
    }
}

/// Client-side router flavour of the application.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouterType {
    #[default]
    Browser,
    Hash,
    Memory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_only_flags() {
        assert!(!RenderMode::ServerRendered.request_document_only());
        assert!(RenderMode::ServerRendered.build_document_only());

        assert!(!RenderMode::StaticallyGenerated.request_document_only());
        assert!(!RenderMode::StaticallyGenerated.build_document_only());

        assert!(RenderMode::ClientOnly.request_document_only());
        assert!(RenderMode::ClientOnly.build_document_only());
    }

    #[test]
    fn test_render_mode_serde() {
        let json = serde_json::to_string(&RenderMode::StaticallyGenerated).unwrap();
        assert_eq!(json, "\"statically-generated\"");
        let mode: RenderMode = serde_json::from_str("\"client-only\"").unwrap();
        assert_eq!(mode, RenderMode::ClientOnly);
        assert_eq!(RenderMode::ServerRendered.as_str(), "server-rendered");
    }

    #[test]
    fn test_router_type_serde() {
        let ty: RouterType = serde_json::from_str("\"memory\"").unwrap();
        assert_eq!(ty, RouterType::Memory);
    }
}
