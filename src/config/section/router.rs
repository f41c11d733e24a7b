//! `[router]` section configuration.
//!
//! ```toml
//! [router]
//! type = "memory"               # "browser" | "hash" | "memory"
//! basename = "/app"
//! inject_initial_entry = true   # memory router: seed routePath into route assets
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::core::RouterType;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    #[serde(rename = "type")]
    pub router_type: RouterType,

    /// URL prefix stripped before route matching.
    pub basename: String,

    /// Prefix each route asset with its initial route path (memory router only).
    pub inject_initial_entry: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            router_type: RouterType::default(),
            basename: "/".into(),
            inject_initial_entry: false,
        }
    }
}

impl RouterConfig {
    /// Injection only makes sense for in-memory routers.
    pub fn should_inject_initial_entry(&self) -> bool {
        self.router_type == RouterType::Memory && self.inject_initial_entry
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !self.basename.starts_with('/') {
            diag.error_with_hint(
                FieldPath::new("router.basename"),
                format!("basename `{}` must start with `/`", self.basename),
                format!("use \"/{}\"", self.basename),
            );
        }
        if self.inject_initial_entry && self.router_type != RouterType::Memory {
            diag.warn(
                FieldPath::new("router.inject_initial_entry"),
                "only applies to `type = \"memory\"`",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_router_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.router.router_type, RouterType::Browser);
        assert_eq!(config.router.basename, "/");
        assert!(!config.router.should_inject_initial_entry());
    }

    #[test]
    fn test_router_memory_injection() {
        let config =
            test_parse_config("[router]\ntype = \"memory\"\ninject_initial_entry = true");
        assert!(config.router.should_inject_initial_entry());
    }

    #[test]
    fn test_router_injection_needs_memory() {
        let config = test_parse_config("[router]\ntype = \"hash\"\ninject_initial_entry = true");
        assert!(!config.router.should_inject_initial_entry());
    }

    #[test]
    fn test_router_basename_validation() {
        let config = test_parse_config("[router]\nbasename = \"app\"");
        let mut diag = ConfigDiagnostics::new();
        config.router.validate(&mut diag);
        assert!(diag.has_errors());
    }
}
