//! The view engine: composition, caching and rendering.
//!
//! An [`Engine`] owns one [`ViewConfig`], one content loader and one
//! composed-template cache. It is a cheap handle: clones share the same
//! cache and loader, so an engine can be stored in application state or
//! request extensions and used from any thread.
//!
//! # Rendering
//!
//! A render request names a template and passes data:
//!
//! | Requested name | Master applied | Entry point executed |
//! |----------------|----------------|----------------------|
//! | `index`        | yes            | `layouts/master`     |
//! | `index.html`   | no             | `index`              |
//!
//! The cache is keyed by the content name, so `index` and `index.html`
//! share one entry. A namespace built with the master also serves
//! standalone renders; a namespace built without it is recomposed (with
//! the master) the first time a master render asks for it.
//!
//! # The `include` Helper
//!
//! Every render binds `include(name)` into its context. It renders `name`
//! without the master, against the same data, and inserts the result
//! unescaped:
//!
//! ```rust
//! use minijinja::context;
//! use tplview::{Engine, MemoryLoader, ViewConfig};
//!
//! let loader = MemoryLoader::new()
//!     .with("include", r#"<v>Inc{{ include("echo") }}</v>"#)
//!     .with("echo", "{{ name }}");
//! let engine = Engine::with_loader(ViewConfig::default().with_master(""), loader);
//!
//! let out = engine
//!     .render_to_string("include", &context! { name => "X" })
//!     .unwrap();
//! assert_eq!(out, "<v>IncX</v>");
//! ```
//!
//! Includes may nest up to [`ViewConfig::max_include_depth`] levels; past
//! that the render fails instead of recursing forever.

use std::fmt;
use std::io::Write;
use std::sync::{Arc, PoisonError, RwLock};

use http::StatusCode;
use minijinja::{context, Error as TemplateError, ErrorKind, Value};
use serde::Serialize;

use crate::cache::TemplateCache;
use crate::composer::{compose, ComposedTemplate, RenderRequest};
use crate::config::ViewConfig;
use crate::error::ViewError;
use crate::functions::INCLUDE_FUNCTION;
use crate::loader::{ContentLoader, FileLoader};
use crate::response::{ensure_html_content_type, ResponseSink};

/// A template engine bound to one configuration.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<Inner>,
}

struct Inner {
    config: ViewConfig,
    cache: TemplateCache,
    loader: RwLock<Arc<dyn ContentLoader>>,
}

impl Engine {
    /// Creates an engine reading templates from disk.
    pub fn new(config: ViewConfig) -> Self {
        Self::with_loader(config, FileLoader::new())
    }

    /// Creates an engine with a custom content loader.
    pub fn with_loader(config: ViewConfig, loader: impl ContentLoader + 'static) -> Self {
        let cache = TemplateCache::new(!config.disable_cache);
        Self {
            inner: Arc::new(Inner {
                config,
                cache,
                loader: RwLock::new(Arc::new(loader)),
            }),
        }
    }

    pub fn config(&self) -> &ViewConfig {
        &self.inner.config
    }

    /// Replaces the content loader for this engine and all its clones.
    ///
    /// Cached namespaces were built from the old loader and are dropped.
    pub fn set_loader(&self, loader: impl ContentLoader + 'static) {
        *self
            .inner
            .loader
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Arc::new(loader);
        self.inner.cache.clear();
    }

    /// Drops every cached namespace.
    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    /// Number of cached namespaces.
    pub fn cached_templates(&self) -> usize {
        self.inner.cache.len()
    }

    /// Whether a namespace for the content `name` is cached.
    pub fn is_cached(&self, name: &str) -> bool {
        let (name, _) = self.inner.config.split_extension(name);
        self.inner.cache.contains(name)
    }

    /// Renders `name` as an HTML response.
    ///
    /// Sets `Content-Type: text/html; charset=utf-8` unless the sink already
    /// has a content type, writes `status`, then streams the body. If
    /// execution fails part way, whatever was written stays written.
    pub fn render<R, S>(
        &self,
        sink: &mut R,
        status: StatusCode,
        name: &str,
        data: &S,
    ) -> Result<(), ViewError>
    where
        R: ResponseSink,
        S: Serialize + ?Sized,
    {
        ensure_html_content_type(sink.headers_mut());
        sink.write_status(status).map_err(ViewError::Sink)?;
        self.render_to(sink, name, data)
    }

    /// Renders `name` into any writer, without HTTP concerns.
    pub fn render_to<W, S>(&self, out: &mut W, name: &str, data: &S) -> Result<(), ViewError>
    where
        W: Write,
        S: Serialize + ?Sized,
    {
        let request = RenderRequest::classify(&self.inner.config, name);
        self.execute(out, &request, &Value::from_serialize(data))
    }

    /// Renders `name` into a string.
    pub fn render_to_string<S>(&self, name: &str, data: &S) -> Result<String, ViewError>
    where
        S: Serialize + ?Sized,
    {
        let mut out = Vec::new();
        self.render_to(&mut out, name, data)?;
        Ok(String::from_utf8_lossy(&out).into_owned())
    }

    /// Returns the namespace for `request`, composing it on a cache miss.
    ///
    /// Composition runs outside the cache lock. Two renders racing on the
    /// same uncached name may both compose; the later insert wins.
    pub fn composed(&self, request: &RenderRequest) -> Result<Arc<ComposedTemplate>, ViewError> {
        let inner = &self.inner;

        if let Some(hit) = inner.cache.get(&request.name) {
            if hit.covers(request.use_master) {
                tracing::trace!(template = %request.name, "template cache hit");
                return Ok(hit);
            }
        }

        let loader = inner
            .loader
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let composed = Arc::new(compose(&inner.config, loader.as_ref(), request)?);
        inner.cache.put(&request.name, composed.clone());
        Ok(composed)
    }

    fn execute(
        &self,
        out: &mut dyn Write,
        request: &RenderRequest,
        data: &Value,
    ) -> Result<(), ViewError> {
        let config = &self.inner.config;
        if request.depth > config.max_include_depth {
            return Err(ViewError::IncludeDepth {
                name: request.name.clone(),
                limit: config.max_include_depth,
            });
        }

        let composed = self.composed(request)?;
        let ctx = self.render_context(data, request.depth);
        composed.execute(request.entry(config), ctx, out)
    }

    /// The per-render context: the caller's data plus an `include` bound to
    /// that data. `include` shadows a data key of the same name.
    fn render_context(&self, data: &Value, depth: usize) -> Value {
        let engine = self.clone();
        let scope = data.clone();
        let include = Value::from_function(move |name: String| -> Result<Value, TemplateError> {
            let request = RenderRequest::standalone(&engine.inner.config, &name, depth + 1);
            let mut buffer = Vec::new();
            engine
                .execute(&mut buffer, &request, &scope)
                .map_err(|err| {
                    TemplateError::new(
                        ErrorKind::InvalidOperation,
                        format!("{}(\"{}\") failed", INCLUDE_FUNCTION, name),
                    )
                    .with_source(err)
                })?;
            Ok(Value::from_safe_string(
                String::from_utf8_lossy(&buffer).into_owned(),
            ))
        });

        context! { include => include, ..data.clone() }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(ViewConfig::default())
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.inner.config)
            .field("cache", &self.inner.cache)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LoadError;
    use crate::loader::MemoryLoader;
    use crate::response::{BufferedResponse, HTML_CONTENT_TYPE};
    use crate::Functions;
    use http::header::{HeaderValue, CONTENT_TYPE};
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn site() -> MemoryLoader {
        MemoryLoader::new()
            .with("layouts/master", "<html>{% include \"content\" %}</html>")
            .with("index", "<v>Index</v>")
            .with("include", r#"<v>Inc{{ include("echo") }}</v>"#)
            .with("echo", "{{ name }}")
            .with("sum", "<v>{{ sum(a, b) }}</v>")
            .with("shout", "{{ echo(name) }}")
    }

    fn engine(config: ViewConfig) -> Engine {
        Engine::with_loader(config, site())
    }

    #[test]
    fn test_master_wraps_logical_name() {
        let engine = engine(ViewConfig::default());
        let out = engine.render_to_string("index", &context! {}).unwrap();
        assert_eq!(out, "<html><v>Index</v></html>");
    }

    #[test]
    fn test_extension_renders_standalone() {
        let engine = engine(ViewConfig::default());
        let out = engine.render_to_string("index.html", &context! {}).unwrap();
        assert_eq!(out, "<v>Index</v>");
    }

    #[test]
    fn test_include_uses_current_data() {
        let engine = engine(ViewConfig::default().with_master(""));
        let out = engine
            .render_to_string("include", &context! { name => "GoView" })
            .unwrap();
        assert_eq!(out, "<v>IncGoView</v>");
    }

    #[test]
    fn test_include_output_is_not_escaped() {
        let loader = site().with("markup", "<b>{{ name }}</b>");
        let loader = loader.with("outer", r#"{{ include("markup") }}"#);
        let engine = Engine::with_loader(ViewConfig::default().with_master(""), loader);

        let out = engine
            .render_to_string("outer", &context! { name => "&" })
            .unwrap();
        assert_eq!(out, "<b>&amp;</b>");
    }

    #[test]
    fn test_data_scoped_function() {
        let engine = engine(ViewConfig::default().with_master(""));
        let data = context! {
            sum => Value::from_function(|a: i64, b: i64| a + b),
            a => 1,
            b => 2,
        };
        assert_eq!(engine.render_to_string("sum", &data).unwrap(), "<v>3</v>");
    }

    #[test]
    fn test_data_function_does_not_leak() {
        let engine = engine(ViewConfig::default().with_master("").with_strict_undefined(true));
        let data = context! {
            sum => Value::from_function(|a: i64, b: i64| a + b),
            a => 1,
            b => 2,
        };
        engine.render_to_string("sum", &data).unwrap();

        let err = engine
            .render_to_string("sum", &context! { a => 1, b => 2 })
            .unwrap_err();
        assert!(matches!(err, ViewError::Execute { .. }));
    }

    #[test]
    fn test_engine_function() {
        let functions = Functions::new()
            .with("echo", |v: String| format!("${}", v))
            .unwrap();
        let engine = engine(
            ViewConfig::default()
                .with_master("")
                .with_functions(functions),
        );
        let out = engine
            .render_to_string("shout", &context! { name => "GoView" })
            .unwrap();
        assert_eq!(out, "$GoView");
    }

    #[test]
    fn test_render_sets_content_type_and_status() {
        let engine = engine(ViewConfig::default());
        let mut response = BufferedResponse::new();
        engine
            .render(&mut response, StatusCode::CREATED, "index", &context! {})
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()[CONTENT_TYPE], HTML_CONTENT_TYPE);
        assert_eq!(response.body_text(), "<html><v>Index</v></html>");
    }

    #[test]
    fn test_render_keeps_caller_content_type() {
        let engine = engine(ViewConfig::default());
        let mut response = BufferedResponse::new();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/xhtml+xml"));
        engine
            .render(&mut response, StatusCode::OK, "index", &context! {})
            .unwrap();

        assert_eq!(response.headers()[CONTENT_TYPE], "application/xhtml+xml");
    }

    #[test]
    fn test_cache_counts_loads_per_name() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let source = site();
        let engine = Engine::with_loader(
            ViewConfig::default(),
            move |config: &ViewConfig, name: &str| -> Result<String, LoadError> {
                counter.fetch_add(1, Ordering::SeqCst);
                source.load(config, name)
            },
        );

        for _ in 0..5 {
            engine.render_to_string("index", &context! {}).unwrap();
        }
        // master + content
        assert_eq!(loads.load(Ordering::SeqCst), 2);
        assert!(engine.is_cached("index"));
        assert_eq!(engine.cached_templates(), 1);
    }

    #[test]
    fn test_disabled_cache_recomposes() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = loads.clone();
        let source = site();
        let engine = Engine::with_loader(
            ViewConfig::default().with_disable_cache(true),
            move |config: &ViewConfig, name: &str| -> Result<String, LoadError> {
                counter.fetch_add(1, Ordering::SeqCst);
                source.load(config, name)
            },
        );

        let first = engine.render_to_string("index", &context! {}).unwrap();
        let second = engine.render_to_string("index", &context! {}).unwrap();
        assert_eq!(first, second);
        assert_eq!(loads.load(Ordering::SeqCst), 4);
        assert_eq!(engine.cached_templates(), 0);
    }

    #[test]
    fn test_standalone_entry_upgraded_for_master() {
        let engine = engine(ViewConfig::default());

        assert_eq!(
            engine.render_to_string("index.html", &context! {}).unwrap(),
            "<v>Index</v>"
        );
        assert_eq!(
            engine.render_to_string("index", &context! {}).unwrap(),
            "<html><v>Index</v></html>"
        );
        assert_eq!(
            engine.render_to_string("index.html", &context! {}).unwrap(),
            "<v>Index</v>"
        );
        assert_eq!(engine.cached_templates(), 1);
    }

    #[test]
    fn test_missing_content_is_not_cached() {
        let engine = engine(ViewConfig::default());
        let err = engine
            .render_to_string("nowhere", &context! {})
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.name(), Some("nowhere"));
        assert!(!engine.is_cached("nowhere"));
        assert_eq!(engine.cached_templates(), 0);
    }

    #[test]
    fn test_include_cycle_hits_depth_limit() {
        let loader = MemoryLoader::new().with("loop", r#"x{{ include("loop") }}"#);
        let engine = Engine::with_loader(
            ViewConfig::default()
                .with_master("")
                .with_max_include_depth(3),
            loader,
        );

        let err = engine.render_to_string("loop", &context! {}).unwrap_err();
        assert!(matches!(err, ViewError::Execute { ref name, .. } if name == "loop"));

        let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
        let mut found_depth = false;
        while let Some(current) = source {
            if let Some(ViewError::IncludeDepth { limit, .. }) = current.downcast_ref::<ViewError>() {
                assert_eq!(*limit, 3);
                found_depth = true;
            }
            source = current.source();
        }
        assert!(found_depth, "expected an IncludeDepth error in {:?}", err);
    }

    #[test]
    fn test_set_loader_clears_cache() {
        let engine = engine(ViewConfig::default().with_master(""));
        assert_eq!(engine.render_to_string("index", &context! {}).unwrap(), "<v>Index</v>");

        engine.set_loader(MemoryLoader::new().with("index", "replaced"));
        assert_eq!(engine.cached_templates(), 0);
        assert_eq!(engine.render_to_string("index", &context! {}).unwrap(), "replaced");
    }

    #[test]
    fn test_clones_share_cache() {
        let engine = engine(ViewConfig::default());
        let clone = engine.clone();
        clone.render_to_string("index", &context! {}).unwrap();
        assert!(engine.is_cached("index"));

        engine.clear_cache();
        assert!(!clone.is_cached("index"));
    }

    #[test]
    fn test_write_failure_propagates() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "client went away"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let engine = engine(ViewConfig::default());
        let err = engine
            .render_to(&mut Broken, "index", &context! {})
            .unwrap_err();
        assert!(matches!(err, ViewError::Execute { .. }));
    }
}
