//! Server module seams.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tiny_http::Request;

use crate::core::RenderMode;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read server entry `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("server entry `{0}` is empty or truncated")]
    Truncated(PathBuf),
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to start `{0}`")]
    Spawn(String, #[source] std::io::Error),

    #[error("server entry exited with {}: {stderr}", .status.map_or_else(|| "a signal".to_owned(), |c| format!("code {c}")))]
    Exit { status: Option<i32>, stderr: String },

    #[error("malformed render response")]
    Protocol(#[source] serde_json::Error),

    #[error("failed to read request body")]
    Body(#[source] std::io::Error),

    #[error("failed to write response")]
    Respond(#[source] std::io::Error),
}

/// Options handed to the server entry with every render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOptions {
    pub render_mode: RenderMode,
    pub document_only: bool,
}

/// Live request being rendered. The request is also the response handle.
pub struct RequestContext {
    pub request: Request,
}

impl RequestContext {
    pub fn new(request: Request) -> Self {
        Self { request }
    }
}

/// What the server entry produced for one render.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RenderResponse {
    #[serde(default = "default_status")]
    pub status: u16,

    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[serde(default)]
    pub body: String,
}

const fn default_status() -> u16 {
    200
}

impl RenderResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// A loaded server entry.
pub trait ServerModule: Send + Sync {
    /// Render a live request; the module writes the response itself.
    fn render_to_response(
        &self,
        ctx: RequestContext,
        options: &RenderOptions,
    ) -> Result<(), RenderError>;

    /// Render a document for `route_path` without a live request.
    fn render_document(
        &self,
        route_path: &str,
        options: &RenderOptions,
    ) -> Result<RenderResponse, RenderError>;
}

/// Turns a server entry file into a `ServerModule`. Blocking.
pub trait ModuleLoader: Send + Sync {
    fn load(&self, entry: &Path) -> Result<Arc<dyn ServerModule>, LoadError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_wire_format() {
        let options = RenderOptions {
            render_mode: RenderMode::ClientOnly,
            document_only: true,
        };
        assert_eq!(
            serde_json::to_string(&options).unwrap(),
            r#"{"renderMode":"client-only","documentOnly":true}"#
        );
    }

    #[test]
    fn test_response_defaults() {
        let response: RenderResponse = serde_json::from_str(r#"{"body":"<html></html>"}"#).unwrap();
        assert_eq!(response.status, 200);
        assert!(response.headers.is_empty());
        assert!(response.is_success());

        let missing: RenderResponse = serde_json::from_str(r#"{"status":404}"#).unwrap();
        assert!(!missing.is_success());
    }
}
