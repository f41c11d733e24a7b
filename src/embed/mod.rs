//! Assets compiled into the binary.
//!
//! - `serve` - dev-server reload client
//!
//! ```ignore
//! let js = serve::RELOAD_JS.render(&serve::ReloadVars { ws_port: 35729 });
//! ```

mod template;

pub use template::{Template, TemplateVars};

pub mod serve {
    use super::{Template, TemplateVars};

    /// URL the dev server answers with [`RELOAD_JS`].
    pub const RELOAD_SCRIPT_PATH: &str = "/__isomer/reload.js";

    /// Variables for reload.js.
    pub struct ReloadVars {
        pub ws_port: u16,
    }

    impl TemplateVars for ReloadVars {
        fn apply(&self, content: &str) -> String {
            content.replace("__ISOMER_WS_PORT__", &self.ws_port.to_string())
        }
    }

    /// Reload client with the WebSocket port filled in.
    pub const RELOAD_JS: Template<ReloadVars> = Template::new(include_str!("serve/reload.js"));

    /// Tag appended to rendered HTML pages in watch mode.
    pub fn reload_snippet() -> String {
        format!(r#"<script src="{RELOAD_SCRIPT_PATH}" defer></script>"#)
    }
}

#[cfg(test)]
mod tests {
    use super::serve::*;

    #[test]
    fn test_reload_js_port() {
        let js = RELOAD_JS.render(&ReloadVars { ws_port: 35731 });
        assert!(js.contains(":35731`"));
        assert!(!js.contains("__ISOMER_WS_PORT__"));
    }

    #[test]
    fn test_reload_snippet() {
        assert_eq!(
            reload_snippet(),
            r#"<script src="/__isomer/reload.js" defer></script>"#
        );
    }
}
