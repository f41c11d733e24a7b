//! The external bundler.
//!
//! The bundler turns the source tree into a client bundle, a server entry
//! and a route manifest. isomer only runs it and checks its result.

use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;

use super::{CompileError, CompileResult};
use crate::config::SiteConfig;
use crate::core::BuildMode;
use crate::debug;
use crate::utils::exec::{Cmd, FilterRule};

/// Noise the common bundlers print on every successful build.
const BUNDLER_FILTER: FilterRule = FilterRule::new(&["vite v", "transforming", "rendering chunks"]);

/// Runs one build cycle. Called from a blocking thread, one call at a time.
pub trait Bundler: Send + Sync + 'static {
    fn build(&self, mode: BuildMode) -> CompileResult;
}

/// Bundler driven by `[build] command`.
#[derive(Debug, Clone)]
pub struct CommandBundler {
    root: PathBuf,
    command: Vec<String>,
    build_args: Vec<String>,
    output_dir: PathBuf,
    server_entry: PathBuf,
}

impl CommandBundler {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            root: config.get_root().to_path_buf(),
            command: config.build.command.clone(),
            build_args: config.build.build_args.clone(),
            output_dir: config.build.output.clone(),
            server_entry: config.build.server_entry.clone(),
        }
    }

    pub fn server_entry(&self) -> &Path {
        &self.server_entry
    }

    fn vars(&self, mode: BuildMode) -> FxHashMap<String, String> {
        bundler_vars(&self.root, &self.output_dir, &self.server_entry, mode)
    }

    /// Final argv: `command` plus `build_args` for production builds.
    fn argv(&self, mode: BuildMode) -> Vec<String> {
        let vars = self.vars(mode);
        let mut argv = resolve_args(&self.command, &vars);
        if !mode.is_dev() {
            argv.extend(resolve_args(&self.build_args, &vars));
        }
        argv
    }
}

impl Bundler for CommandBundler {
    fn build(&self, mode: BuildMode) -> CompileResult {
        let argv = self.argv(mode);
        let Some(program) = argv.first().cloned() else {
            return CompileResult::failed(CompileError::NoCommand);
        };

        debug!("build"; "running `{}`", argv.join(" "));
        let output = match Cmd::from_slice(&argv)
            .cwd(&self.root)
            .envs(self.vars(mode))
            .output()
        {
            Ok(output) => output,
            Err(e) => return CompileResult::failed(CompileError::Spawn(program, e)),
        };

        if crate::logger::is_verbose() {
            BUNDLER_FILTER.log("bundler", &String::from_utf8_lossy(&output.stdout));
        }

        if !output.status.success() {
            // Most bundlers report errors on stdout; keep both streams.
            let mut detail = String::from_utf8_lossy(&output.stderr).into_owned();
            if detail.trim().is_empty() {
                detail = String::from_utf8_lossy(&output.stdout).into_owned();
            }
            return CompileResult::failed(CompileError::Exit {
                command: program,
                status: output.status.code(),
                stderr: crate::utils::exec::strip_ansi(&detail).into_owned(),
            });
        }

        if !self.server_entry.is_file() {
            return CompileResult::failed(CompileError::MissingEntry(self.server_entry.clone()));
        }

        CompileResult::ready(&self.server_entry)
    }
}

/// [`CommandBundler`] rebuilt from the current config on every run, so an
/// edited `isomer.toml` applies to the next rebuild.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiveBundler;

impl Bundler for LiveBundler {
    fn build(&self, mode: BuildMode) -> CompileResult {
        CommandBundler::from_config(&crate::config::cfg()).build(mode)
    }
}

// ============================================================================
// Environment Variables
// ============================================================================

/// `$ISOMER_*` variables exported to the bundler.
pub fn bundler_vars(
    root: &Path,
    output_dir: &Path,
    server_entry: &Path,
    mode: BuildMode,
) -> FxHashMap<String, String> {
    let mut vars = FxHashMap::default();
    vars.insert("ISOMER_ROOT".into(), root.display().to_string());
    vars.insert("ISOMER_OUTPUT_DIR".into(), output_dir.display().to_string());
    vars.insert("ISOMER_SERVER_ENTRY".into(), server_entry.display().to_string());
    vars.insert("ISOMER_MODE".into(), mode.as_env().into());
    vars
}

/// Replace `$ISOMER_XXX` occurrences in command arguments.
///
/// Longer names are substituted first so `$ISOMER_ROOT` never eats the
/// prefix of a longer variable.
pub fn resolve_args(args: &[String], vars: &FxHashMap<String, String>) -> Vec<String> {
    let mut keys: Vec<&String> = vars.keys().collect();
    keys.sort_by_key(|k| std::cmp::Reverse(k.len()));

    args.iter()
        .map(|arg| {
            keys.iter().fold(arg.clone(), |acc, key| {
                acc.replace(&format!("${key}"), &vars[*key])
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bundler(root: &Path, command: &[&str]) -> CommandBundler {
        CommandBundler {
            root: root.to_path_buf(),
            command: command.iter().map(|s| s.to_string()).collect(),
            build_args: vec!["--minify".into()],
            output_dir: root.join("dist"),
            server_entry: root.join("dist/server/index.mjs"),
        }
    }

    #[test]
    fn test_resolve_args() {
        let vars = bundler_vars(
            Path::new("/app"),
            Path::new("/app/dist"),
            Path::new("/app/dist/server/index.mjs"),
            BuildMode::Development,
        );
        let args = vec![
            "--outDir=$ISOMER_OUTPUT_DIR".to_string(),
            "$ISOMER_MODE".to_string(),
            "plain".to_string(),
        ];
        assert_eq!(
            resolve_args(&args, &vars),
            vec!["--outDir=/app/dist", "serve", "plain"]
        );
    }

    #[test]
    fn test_build_args_only_in_production() {
        let b = bundler(Path::new("/app"), &["vite", "build"]);
        assert_eq!(b.argv(BuildMode::Development), vec!["vite", "build"]);
        assert_eq!(
            b.argv(BuildMode::Production),
            vec!["vite", "build", "--minify"]
        );
    }

    #[test]
    fn test_empty_command() {
        let dir = TempDir::new().unwrap();
        let mut b = bundler(dir.path(), &[]);
        b.build_args.clear();
        assert!(matches!(
            b.build(BuildMode::Development).error(),
            Some(CompileError::NoCommand)
        ));
    }

    #[test]
    fn test_spawn_failure() {
        let dir = TempDir::new().unwrap();
        let b = bundler(dir.path(), &["isomer-test-no-such-bundler"]);
        assert!(matches!(
            b.build(BuildMode::Development).error(),
            Some(CompileError::Spawn(..))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_writes_entry() {
        let dir = TempDir::new().unwrap();
        let b = bundler(
            dir.path(),
            &[
                "sh",
                "-c",
                "mkdir -p \"$ISOMER_OUTPUT_DIR/server\" && echo 'x' > \"$ISOMER_SERVER_ENTRY\"",
            ],
        );
        let result = b.build(BuildMode::Development);
        assert_eq!(result.server_entry(), Some(b.server_entry()));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_failure_and_missing_entry() {
        let dir = TempDir::new().unwrap();

        let failing = bundler(dir.path(), &["sh", "-c", "echo 'syntax error' >&2; exit 2"]);
        let result = failing.build(BuildMode::Development);
        let Some(CompileError::Exit { status, stderr, .. }) = result.error() else {
            panic!("expected exit error, got {result:?}");
        };
        assert_eq!(*status, Some(2));
        assert_eq!(stderr.trim(), "syntax error");

        let silent = bundler(dir.path(), &["true"]);
        assert!(matches!(
            silent.build(BuildMode::Development).error(),
            Some(CompileError::MissingEntry(_))
        ));
    }
}
