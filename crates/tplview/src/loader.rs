//! Pluggable template source loading.
//!
//! The composer never touches the filesystem itself. It asks a
//! [`ContentLoader`] for the source of each logical name, and a loader
//! either returns the text or a [`LoadError`] explaining why it could not.
//!
//! # Name Resolution
//!
//! The default [`FileLoader`] resolves a logical name against the engine's
//! root and extension:
//!
//! | Root          | Extension | Logical name      | File                                |
//! |---------------|-----------|-------------------|-------------------------------------|
//! | `views`       | `.html`   | `index`           | `views/index.html`                  |
//! | `views`       | `.html`   | `layouts/master`  | `views/layouts/master.html`         |
//! | `app/views`   | `.tpl`    | `partials/ad`     | `app/views/partials/ad.tpl`         |
//!
//! # Custom Loaders
//!
//! Any `Fn(&ViewConfig, &str) -> Result<String, LoadError>` is a loader, as
//! is [`MemoryLoader`] for templates compiled into the binary:
//!
//! ```rust
//! use tplview::{Engine, LoadError, ViewConfig};
//!
//! let engine = Engine::with_loader(
//!     ViewConfig::default().with_master(""),
//!     |_config: &ViewConfig, name: &str| match name {
//!         "hello" => Ok("Hello, {{ who }}!".to_string()),
//!         _ => Err(LoadError::not_found(name)),
//!     },
//! );
//!
//! let out = engine
//!     .render_to_string("hello", &minijinja::context! { who => "world" })
//!     .unwrap();
//! assert_eq!(out, "Hello, world!");
//! ```

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::ViewConfig;
use crate::error::LoadError;

/// Resolves a logical template name to its source text.
///
/// Implementations must be deterministic for a given config and name, and
/// must report missing sources as errors instead of panicking.
pub trait ContentLoader: Send + Sync {
    fn load(&self, config: &ViewConfig, name: &str) -> Result<String, LoadError>;
}

impl<F> ContentLoader for F
where
    F: Fn(&ViewConfig, &str) -> Result<String, LoadError> + Send + Sync,
{
    fn load(&self, config: &ViewConfig, name: &str) -> Result<String, LoadError> {
        self(config, name)
    }
}

/// Reads templates from `root/name + extension` on disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileLoader;

impl FileLoader {
    pub fn new() -> Self {
        Self
    }

    /// The absolute path a logical name resolves to.
    pub fn resolve(config: &ViewConfig, name: &str) -> io::Result<PathBuf> {
        let relative = config.root.join(format!("{}{}", name, config.extension));
        std::path::absolute(relative)
    }
}

impl ContentLoader for FileLoader {
    fn load(&self, config: &ViewConfig, name: &str) -> Result<String, LoadError> {
        let path = FileLoader::resolve(config, name).map_err(|source| LoadError::Io {
            name: name.to_string(),
            path: Some(config.root.join(name)),
            source,
        })?;

        tracing::trace!(template = name, path = %path.display(), "reading template");

        std::fs::read_to_string(&path).map_err(|source| read_error(name, path, source))
    }
}

fn read_error(name: &str, path: PathBuf, source: io::Error) -> LoadError {
    if source.kind() == io::ErrorKind::NotFound {
        LoadError::NotFound {
            name: name.to_string(),
            path: Some(path),
        }
    } else {
        LoadError::Io {
            name: name.to_string(),
            path: Some(path),
            source,
        }
    }
}

/// Serves templates from an in-memory map of logical name to source.
///
/// Names may be registered with or without the engine's extension; lookups
/// always use the logical name.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    sources: HashMap<String, String>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a template source.
    pub fn add(&mut self, name: impl Into<String>, source: impl Into<String>) -> &mut Self {
        self.sources.insert(name.into(), source.into());
        self
    }

    /// Chained form of [`add`](Self::add).
    pub fn with(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.add(name, source);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Builds a loader from every file under `dir` that carries `extension`.
    ///
    /// Files are keyed by their path relative to `dir` with the extension
    /// stripped and `/` as separator, which matches how [`FileLoader`]
    /// resolves names.
    pub fn from_dir(dir: impl AsRef<Path>, extension: &str) -> io::Result<Self> {
        let dir = dir.as_ref();
        let mut loader = Self::new();
        let mut pending = vec![dir.to_path_buf()];

        while let Some(current) = pending.pop() {
            for entry in std::fs::read_dir(&current)? {
                let path = entry?.path();
                if path.is_dir() {
                    pending.push(path);
                    continue;
                }
                let Ok(relative) = path.strip_prefix(dir) else {
                    continue;
                };
                let relative = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if let Some(name) = relative.strip_suffix(extension) {
                    if !name.is_empty() {
                        let source = std::fs::read_to_string(&path)?;
                        loader.add(name, source);
                    }
                }
            }
        }

        Ok(loader)
    }
}

impl ContentLoader for MemoryLoader {
    fn load(&self, config: &ViewConfig, name: &str) -> Result<String, LoadError> {
        self.sources
            .get(name)
            .or_else(|| self.sources.get(&format!("{}{}", name, config.extension)))
            .cloned()
            .ok_or_else(|| LoadError::not_found(name))
    }
}

impl<K, V> FromIterator<(K, V)> for MemoryLoader
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            sources: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
