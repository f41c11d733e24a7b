//! Build mode: one-shot production build or watch-mode dev server.

/// Which command drives the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    /// `isomer build`: compile once, generate documents, exit.
    Production,
    /// `isomer serve`: compile, watch, rebuild on change.
    Development,
}

impl BuildMode {
    /// Value exported to the bundler as `$ISOMER_MODE`.
    pub const fn as_env(self) -> &'static str {
        match self {
            Self::Production => "build",
            Self::Development => "serve",
        }
    }

    #[inline]
    pub const fn is_dev(self) -> bool {
        matches!(self, Self::Development)
    }
}
