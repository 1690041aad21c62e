//! Error types for view composition and rendering.
//!
//! Every failure carries the logical template name it relates to, so a
//! caller can tell which source broke without walking the error chain.
//! Nothing here is retried: composing the same inputs again reproduces the
//! same error.

use std::io;
use std::path::PathBuf;

/// Errors produced by a [`ContentLoader`](crate::ContentLoader).
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// No source exists for the logical name.
    #[error("template \"{name}\" not found{}", display_path(.path))]
    NotFound {
        /// Logical name that was requested.
        name: String,
        /// Resolved location, when the loader has one.
        path: Option<PathBuf>,
    },

    /// The source exists but could not be read.
    #[error("failed to read template \"{name}\"{}: {source}", display_path(.path))]
    Io {
        /// Logical name that was requested.
        name: String,
        /// Resolved location, when the loader has one.
        path: Option<PathBuf>,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
}

impl LoadError {
    /// Create a not-found error without a path (for non-filesystem loaders).
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound {
            name: name.into(),
            path: None,
        }
    }

    /// The logical name that failed to load.
    pub fn name(&self) -> &str {
        match self {
            LoadError::NotFound { name, .. } | LoadError::Io { name, .. } => name,
        }
    }

    /// The resolved path, if the loader works on paths.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            LoadError::NotFound { path, .. } | LoadError::Io { path, .. } => path.as_ref(),
        }
    }
}

fn display_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(path) => format!(" at {}", path.display()),
        None => String::new(),
    }
}

/// Error type for all composition and rendering operations.
#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// A source could not be loaded. Composition was aborted.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A source failed to parse.
    #[error("failed to parse template \"{name}\": {source}")]
    Parse {
        /// Logical name of the offending source.
        name: String,
        #[source]
        source: minijinja::Error,
    },

    /// Template evaluation failed, including failures writing to the sink.
    #[error("failed to execute template \"{name}\": {source}")]
    Execute {
        /// Entry-point name that was being executed.
        name: String,
        #[source]
        source: minijinja::Error,
    },

    /// Nested `include` calls went deeper than the configured limit.
    #[error("include of \"{name}\" exceeds the maximum depth of {limit}")]
    IncludeDepth {
        /// Template whose include crossed the limit.
        name: String,
        /// Configured maximum depth.
        limit: usize,
    },

    /// The response sink rejected the status line.
    #[error("failed to write response status: {0}")]
    Sink(#[source] io::Error),

    /// Invalid engine configuration (function names, delimiters).
    #[error("invalid view configuration: {0}")]
    Config(String),
}

impl ViewError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The logical template name this error is about, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            ViewError::Load(err) => Some(err.name()),
            ViewError::Parse { name, .. }
            | ViewError::Execute { name, .. }
            | ViewError::IncludeDepth { name, .. } => Some(name),
            ViewError::Sink(_) | ViewError::Config(_) => None,
        }
    }

    /// Whether this error means a source does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ViewError::Load(LoadError::NotFound { .. }))
    }
}
