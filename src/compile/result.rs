//! Outcome of one bundler run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("bundler command is empty")]
    NoCommand,

    #[error("failed to run `{0}`")]
    Spawn(String, #[source] std::io::Error),

    #[error("`{command}` exited with {}", .status.map_or_else(|| "a signal".to_owned(), |c| format!("code {c}")))]
    Exit {
        command: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("bundler finished but did not write `{0}`")]
    MissingEntry(PathBuf),

    #[error("no compile result after {0:?}")]
    Timeout(Duration),

    #[error("build task aborted: {0}")]
    Aborted(String),
}

impl CompileError {
    /// Captured bundler output worth showing under the summary line.
    pub fn detail(&self) -> &str {
        match self {
            Self::Exit { stderr, .. } => stderr.trim(),
            _ => "",
        }
    }
}

/// Immutable result of a compile cycle. Shared as `Arc<CompileResult>`.
#[derive(Debug)]
pub enum CompileResult {
    Ready { server_entry: PathBuf },
    Failed { error: CompileError },
}

impl CompileResult {
    pub fn ready(server_entry: impl Into<PathBuf>) -> Self {
        Self::Ready {
            server_entry: server_entry.into(),
        }
    }

    pub fn failed(error: CompileError) -> Self {
        Self::Failed { error }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub fn server_entry(&self) -> Option<&Path> {
        match self {
            Self::Ready { server_entry } => Some(server_entry),
            Self::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&CompileError> {
        match self {
            Self::Ready { .. } => None,
            Self::Failed { error } => Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let ready = CompileResult::ready("/app/dist/server/index.mjs");
        assert!(ready.is_ready());
        assert_eq!(
            ready.server_entry(),
            Some(Path::new("/app/dist/server/index.mjs"))
        );
        assert!(ready.error().is_none());

        let failed = CompileResult::failed(CompileError::NoCommand);
        assert!(!failed.is_ready());
        assert!(failed.server_entry().is_none());
    }

    #[test]
    fn test_exit_display() {
        let err = CompileError::Exit {
            command: "vite".into(),
            status: Some(1),
            stderr: "  src/app.tsx: unexpected token\n".into(),
        };
        assert_eq!(err.to_string(), "`vite` exited with code 1");
        assert_eq!(err.detail(), "src/app.tsx: unexpected token");

        let killed = CompileError::Exit {
            command: "vite".into(),
            status: None,
            stderr: String::new(),
        };
        assert_eq!(killed.to_string(), "`vite` exited with a signal");
    }
}
