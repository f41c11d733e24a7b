//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! output = "dist"
//! server_entry = "dist/server/index.mjs"
//! manifest = ".isomer/route-manifest.json"
//! pages = "src/pages"
//! command = ["npx", "vite", "build", "--outDir", "$ISOMER_OUTPUT_DIR"]
//! build_args = ["--minify"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};
use crate::utils::path::normalize_path;

/// Build paths and the external bundler command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSectionConfig {
    /// Output directory of the client bundle and generated documents.
    pub output: PathBuf,

    /// Compiled server entry written by the bundler.
    pub server_entry: PathBuf,

    /// Route manifest (JSON) written by the bundler.
    pub manifest: PathBuf,

    /// Directory the manifest's page files are relative to.
    pub pages: PathBuf,

    /// Bundler command. Supports `$ISOMER_*` variable substitution.
    pub command: Vec<String>,

    /// Extra bundler arguments appended only during `isomer build`.
    pub build_args: Vec<String>,

    /// Remove the output directory before the first build (CLI only).
    #[serde(skip)]
    pub clean: bool,
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            output: "dist".into(),
            server_entry: "dist/server/index.mjs".into(),
            manifest: ".isomer/route-manifest.json".into(),
            pages: "src/pages".into(),
            command: Vec::new(),
            build_args: Vec::new(),
            clean: false,
        }
    }
}

impl BuildSectionConfig {
    /// Make every path absolute against the project root.
    pub fn normalize(&mut self, root: &Path) {
        self.output = normalize_path(&root.join(&self.output));
        self.server_entry = normalize_path(&root.join(&self.server_entry));
        self.manifest = normalize_path(&root.join(&self.manifest));
        self.pages = normalize_path(&root.join(&self.pages));
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.command.is_empty() {
            diag.error_with_hint(
                FieldPath::new("build.command"),
                "bundler command is empty",
                "set e.g. command = [\"npx\", \"vite\", \"build\"]",
            );
        }
        if self.server_entry.extension().is_none() {
            diag.error(
                FieldPath::new("build.server_entry"),
                "server entry must be a file path with an extension",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;
    use std::path::PathBuf;

    #[test]
    fn test_build_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert_eq!(config.build.pages, PathBuf::from("src/pages"));
        assert!(config.build.build_args.is_empty());
    }

    #[test]
    fn test_build_command() {
        let config = test_parse_config(
            "[build]\ncommand = [\"npx\", \"vite\", \"build\"]\nbuild_args = [\"--minify\"]",
        );
        assert_eq!(config.build.command, vec!["npx", "vite", "build"]);
        assert_eq!(config.build.build_args, vec!["--minify"]);
    }

    #[test]
    fn test_build_normalize() {
        let mut config = test_parse_config("[build]\noutput = \"out\"");
        config.build.normalize(std::path::Path::new("/site"));
        assert_eq!(config.build.output, PathBuf::from("/site/out"));
        assert_eq!(
            config.build.server_entry,
            PathBuf::from("/site/dist/server/index.mjs")
        );
    }

    #[test]
    fn test_build_validate_empty_command() {
        let config = test_parse_config("[build]\ncommand = []");
        let mut diag = crate::config::ConfigDiagnostics::new();
        config.build.validate(&mut diag);
        assert_eq!(diag.len(), 1);
        assert_eq!(diag.errors()[0].field.as_str(), "build.command");
    }
}
