//! `[render]` section configuration.
//!
//! ```toml
//! [render]
//! mode = "server-rendered"       # or "statically-generated", "client-only"
//! runtime = ["node"]             # runs the server entry
//! compile_timeout_ms = 30000     # 0 = wait forever
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::core::RenderMode;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub mode: RenderMode,

    /// Command prefix the server entry is executed with.
    pub runtime: Vec<String>,

    /// Upper bound for a request waiting on the current compile cycle.
    pub compile_timeout_ms: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::default(),
            runtime: vec!["node".into()],
            compile_timeout_ms: 30_000,
        }
    }
}

impl RenderConfig {
    pub fn compile_timeout(&self) -> Option<Duration> {
        (self.compile_timeout_ms > 0).then(|| Duration::from_millis(self.compile_timeout_ms))
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.runtime.is_empty() {
            diag.error_with_hint(
                FieldPath::new("render.runtime"),
                "runtime command is empty",
                "the server entry is run as `<runtime...> <server_entry>`, e.g. [\"node\"]",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_render_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.render.mode, RenderMode::ServerRendered);
        assert_eq!(config.render.runtime, vec!["node"]);
        assert_eq!(
            config.render.compile_timeout(),
            Some(Duration::from_secs(30))
        );
    }

    #[test]
    fn test_render_mode_and_no_timeout() {
        let config =
            test_parse_config("[render]\nmode = \"statically-generated\"\ncompile_timeout_ms = 0");
        assert_eq!(config.render.mode, RenderMode::StaticallyGenerated);
        assert_eq!(config.render.compile_timeout(), None);
    }

    #[test]
    fn test_render_invalid_mode() {
        let result = crate::config::SiteConfig::from_str("[render]\nmode = \"ssr\"");
        assert!(result.is_err());
    }
}
