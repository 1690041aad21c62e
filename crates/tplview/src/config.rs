//! Engine configuration.
//!
//! A [`ViewConfig`] is fixed for the lifetime of an [`Engine`](crate::Engine).
//! Every field has a default, so a config can be built in code with the
//! chained `with_*` setters or deserialized from YAML/JSON with only the
//! fields that differ:
//!
//! ```rust
//! use tplview::ViewConfig;
//!
//! let config = ViewConfig::from_yaml(r#"
//! root: app/views
//! partials: [partials/ad]
//! disable_cache: true
//! "#).unwrap();
//!
//! assert_eq!(config.extension, ".html");
//! assert_eq!(config.master, "layouts/master");
//! assert_eq!(config.partials, vec!["partials/ad".to_string()]);
//! ```
//!
//! Helper functions cannot be expressed in a config file; attach them with
//! [`ViewConfig::with_functions`] after loading.

use std::path::{Path, PathBuf};

use minijinja::syntax::SyntaxConfig;
use serde::{Deserialize, Serialize};

use crate::error::ViewError;
use crate::functions::Functions;

/// Default template root directory.
pub const DEFAULT_ROOT: &str = "views";
/// Default template file extension.
pub const DEFAULT_EXTENSION: &str = ".html";
/// Default master layout name.
pub const DEFAULT_MASTER: &str = "layouts/master";
/// Default alias the master uses to embed the content template.
pub const DEFAULT_CONTENT_SLOT: &str = "content";
/// Default limit for nested `include` calls.
pub const DEFAULT_MAX_INCLUDE_DEPTH: usize = 32;

/// Markers bounding template expressions.
///
/// Only the expression markers are configurable; block tags keep their
/// `{%`/`%}` form and comments keep `{#`/`#}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delimiters {
    pub left: String,
    pub right: String,
}

impl Delimiters {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Builds the host syntax configuration for these markers.
    pub(crate) fn syntax(&self) -> Result<SyntaxConfig, ViewError> {
        if self.left.is_empty() || self.right.is_empty() {
            return Err(ViewError::config("delimiters must not be empty"));
        }
        SyntaxConfig::builder()
            .variable_delimiters(self.left.clone(), self.right.clone())
            .build()
            .map_err(|e| {
                ViewError::config(format!(
                    "invalid delimiters {:?}/{:?}: {}",
                    self.left, self.right, e
                ))
            })
    }
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::new("{{", "}}")
    }
}

/// Configuration for one [`Engine`](crate::Engine).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Directory the default file loader resolves names against.
    pub root: PathBuf,

    /// Template file suffix, including the dot.
    ///
    /// Requesting a name that ends with this suffix renders that file
    /// standalone, without the master layout.
    pub extension: String,

    /// Master layout name. Empty disables the master.
    pub master: String,

    /// Partials composed alongside every content template, in parse order.
    pub partials: Vec<String>,

    /// Engine-wide helper functions.
    #[serde(skip)]
    pub functions: Functions,

    /// Recompose on every render instead of caching.
    pub disable_cache: bool,

    /// Expression delimiters.
    pub delimiters: Delimiters,

    /// Name the content template is also registered under when a master
    /// applies, so the master can `{% include "content" %}` it.
    /// Empty disables the alias.
    pub content_slot: String,

    /// Maximum nesting of `include` calls before a render fails.
    pub max_include_depth: usize,

    /// Fail on undefined variables instead of rendering them empty.
    pub strict_undefined: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            extension: DEFAULT_EXTENSION.to_string(),
            master: DEFAULT_MASTER.to_string(),
            partials: Vec::new(),
            functions: Functions::new(),
            disable_cache: false,
            delimiters: Delimiters::default(),
            content_slot: DEFAULT_CONTENT_SLOT.to_string(),
            max_include_depth: DEFAULT_MAX_INCLUDE_DEPTH,
            strict_undefined: false,
        }
    }
}

impl ViewConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a config from YAML. Missing fields take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, ViewError> {
        serde_yaml::from_str(yaml).map_err(|e| ViewError::config(e.to_string()))
    }

    /// Parses a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ViewError> {
        serde_json::from_str(json).map_err(|e| ViewError::config(e.to_string()))
    }

    pub fn with_root(mut self, root: impl AsRef<Path>) -> Self {
        self.root = root.as_ref().to_path_buf();
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Sets the master layout. Pass `""` to render without one.
    pub fn with_master(mut self, master: impl Into<String>) -> Self {
        self.master = master.into();
        self
    }

    pub fn with_partials<I, S>(mut self, partials: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.partials = partials.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_functions(mut self, functions: Functions) -> Self {
        self.functions = functions;
        self
    }

    pub fn with_disable_cache(mut self, disable: bool) -> Self {
        self.disable_cache = disable;
        self
    }

    pub fn with_delimiters(mut self, left: impl Into<String>, right: impl Into<String>) -> Self {
        self.delimiters = Delimiters::new(left, right);
        self
    }

    pub fn with_content_slot(mut self, slot: impl Into<String>) -> Self {
        self.content_slot = slot.into();
        self
    }

    pub fn with_max_include_depth(mut self, depth: usize) -> Self {
        self.max_include_depth = depth;
        self
    }

    pub fn with_strict_undefined(mut self, strict: bool) -> Self {
        self.strict_undefined = strict;
        self
    }

    /// Whether a master layout is configured at all.
    pub fn has_master(&self) -> bool {
        !self.master.is_empty()
    }

    /// Strips the configured extension from `name`.
    ///
    /// Returns the logical name and whether the extension was present.
    /// A name that is only the extension is treated as logical.
    pub fn split_extension<'a>(&self, name: &'a str) -> (&'a str, bool) {
        if self.extension.is_empty() {
            return (name, false);
        }
        match name.strip_suffix(self.extension.as_str()) {
            Some(stripped) if !stripped.is_empty() => (stripped, true),
            _ => (name, false),
        }
    }
}
