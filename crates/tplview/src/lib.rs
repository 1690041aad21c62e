//! # tplview - Layout-Composed HTML Views
//!
//! `tplview` renders named HTML pages out of three kinds of template files:
//! a **master** layout, the page's own **content**, and shared **partials**.
//! All three are parsed into one namespace per page, so the master can embed
//! the content and any template can include any partial by name.
//!
//! ## Core Concepts
//!
//! - [`ViewConfig`]: Root directory, extension, master, partials, helper
//!   functions, delimiters and cache switch
//! - [`Engine`]: Composes, caches and renders pages for one config
//! - [`ContentLoader`]: Where template sources come from ([`FileLoader`],
//!   [`MemoryLoader`], or any closure)
//! - [`ResponseSink`]: An HTTP response to render into
//! - [`instance`]: A process-wide default engine
//!
//! ## Quick Start
//!
//! ```rust
//! use tplview::{context, Engine, MemoryLoader, ViewConfig};
//!
//! let loader = MemoryLoader::new()
//!     .with("layouts/master", r#"<html><body>{% include "content" %}</body></html>"#)
//!     .with("index", "<h1>{{ title }}</h1>");
//! let engine = Engine::with_loader(ViewConfig::default(), loader);
//!
//! // A logical name is wrapped by the master...
//! let page = engine.render_to_string("index", &context! { title => "Home" }).unwrap();
//! assert_eq!(page, "<html><body><h1>Home</h1></body></html>");
//!
//! // ...a name with the extension renders that file alone.
//! let bare = engine.render_to_string("index.html", &context! { title => "Home" }).unwrap();
//! assert_eq!(bare, "<h1>Home</h1>");
//! ```
//!
//! ## Template Syntax
//!
//! Templates use MiniJinja syntax. The master embeds the page with
//! `{% include "content" %}`; partials listed in the config are included by
//! their logical name. Every render also binds `include(name)`, which renders
//! another template standalone against the current data:
//!
//! ```jinja
//! <aside>{{ include("partials/ad") }}</aside>
//! ```
//!
//! Output is HTML-escaped when the configured extension is `.html` or
//! `.htm`, and left as-is otherwise.

pub mod cache;
pub mod composer;
pub mod config;
mod engine;
mod error;
pub mod functions;
pub mod instance;
pub mod loader;
pub mod response;

// Engine
pub use engine::Engine;

// Configuration
pub use config::{
    Delimiters, ViewConfig, DEFAULT_CONTENT_SLOT, DEFAULT_EXTENSION, DEFAULT_MASTER,
    DEFAULT_MAX_INCLUDE_DEPTH, DEFAULT_ROOT,
};
pub use functions::{Functions, INCLUDE_FUNCTION};

// Composition and caching
pub use cache::TemplateCache;
pub use composer::{compose, ComposedTemplate, RenderRequest};

// Loading
pub use loader::{ContentLoader, FileLoader, MemoryLoader};

// Errors
pub use error::{LoadError, ViewError};

// Output
pub use response::{ensure_html_content_type, BufferedResponse, ResponseSink, HTML_CONTENT_TYPE};

// Default instance
pub use instance::{default_engine, use_engine};

// Template values, so callers need not depend on minijinja directly
pub use minijinja::{context, Value};
