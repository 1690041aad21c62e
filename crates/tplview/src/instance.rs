//! The process-wide default engine.
//!
//! Applications with a single view tree can skip passing an [`Engine`]
//! around. The first call to [`default_engine`] (or [`render`]) lazily
//! builds one from [`ViewConfig::default`]; [`use_engine`] replaces it.
//!
//! Replacing the default while renders are in flight is safe: each render
//! holds its own handle, taken when it started.

use std::io::Write;
use std::sync::{PoisonError, RwLock};

use http::StatusCode;
use once_cell::sync::Lazy;
use serde::Serialize;

use crate::config::ViewConfig;
use crate::engine::Engine;
use crate::error::ViewError;
use crate::response::ResponseSink;

static DEFAULT_ENGINE: Lazy<RwLock<Option<Engine>>> = Lazy::new(|| RwLock::new(None));

/// Installs `engine` as the default, replacing any previous one.
pub fn use_engine(engine: Engine) {
    tracing::debug!(root = %engine.config().root.display(), "installing default view engine");
    *DEFAULT_ENGINE
        .write()
        .unwrap_or_else(PoisonError::into_inner) = Some(engine);
}

/// Returns the default engine, creating it from the default config on
/// first use.
pub fn default_engine() -> Engine {
    if let Some(engine) = DEFAULT_ENGINE
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
    {
        return engine.clone();
    }

    DEFAULT_ENGINE
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .get_or_insert_with(|| Engine::new(ViewConfig::default()))
        .clone()
}

/// Removes the default engine. The next [`default_engine`] call builds a
/// fresh one.
pub fn reset_default_engine() {
    DEFAULT_ENGINE
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
}

/// [`Engine::render`] on the default engine.
pub fn render<R, S>(sink: &mut R, status: StatusCode, name: &str, data: &S) -> Result<(), ViewError>
where
    R: ResponseSink,
    S: Serialize + ?Sized,
{
    default_engine().render(sink, status, name, data)
}

/// [`Engine::render_to`] on the default engine.
pub fn render_to<W, S>(out: &mut W, name: &str, data: &S) -> Result<(), ViewError>
where
    W: Write,
    S: Serialize + ?Sized,
{
    default_engine().render_to(out, name, data)
}
