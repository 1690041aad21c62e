//! Composition of master, content and partials into one namespace.
//!
//! A [`ComposedTemplate`] is a single host environment holding every source
//! a page needs, each under its own logical name. The master, the content
//! and the partials are siblings in that namespace: any of them can
//! `{% include %}` any other by name, and they all see the same engine
//! functions, delimiters and escaping rules.
//!
//! ## Parse Order
//!
//! Sources are parsed in the order `[master, content, ...partials]`. When a
//! master applies, the content is also registered under the configured
//! content slot (default `"content"`) right after its own name, which is
//! how the master embeds it:
//!
//! ```jinja
//! <html><body>{% include "content" %}</body></html>
//! ```
//!
//! A later source replaces an earlier one with the same name. A partial
//! called `content` therefore shadows the slot alias, and a partial
//! sharing the content's name shadows the content itself.
//!
//! ## Failure
//!
//! Composition is all or nothing. The first load or parse failure aborts it
//! and nothing is returned for caching.

use std::fmt;
use std::io::Write;

use minijinja::{default_auto_escape_callback, Environment, UndefinedBehavior, Value};

use crate::config::ViewConfig;
use crate::error::ViewError;
use crate::loader::ContentLoader;

/// One render's routing decision: which content, whether the master wraps
/// it, and how deep in an include chain it sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderRequest {
    /// Logical content name, extension stripped.
    pub name: String,
    /// Whether the master layout should wrap the content.
    pub use_master: bool,
    /// Include nesting level; zero for a top-level render.
    pub depth: usize,
}

impl RenderRequest {
    /// Classifies a requested name.
    ///
    /// A name ending with the configured extension renders that file
    /// standalone; any other name is a logical name wrapped by the master.
    pub fn classify(config: &ViewConfig, requested: &str) -> Self {
        let (name, exact_file) = config.split_extension(requested);
        Self {
            name: name.to_string(),
            use_master: !exact_file,
            depth: 0,
        }
    }

    /// A master-less request, as issued by `include`.
    pub fn standalone(config: &ViewConfig, requested: &str, depth: usize) -> Self {
        let (name, _) = config.split_extension(requested);
        Self {
            name: name.to_string(),
            use_master: false,
            depth,
        }
    }

    /// Whether the master applies under `config`.
    pub fn wants_master(&self, config: &ViewConfig) -> bool {
        self.use_master && config.has_master()
    }

    /// The template to execute: the master when it applies, else the content.
    pub fn entry<'a>(&'a self, config: &'a ViewConfig) -> &'a str {
        if self.wants_master(config) {
            &config.master
        } else {
            &self.name
        }
    }
}

/// A fully parsed namespace of master, content and partials.
pub struct ComposedTemplate {
    env: Environment<'static>,
    content: String,
    master: Option<String>,
    names: Vec<String>,
}

impl ComposedTemplate {
    /// The content template this namespace was built for.
    pub fn content_name(&self) -> &str {
        &self.content
    }

    /// The master parsed into this namespace, if any.
    pub fn master_name(&self) -> Option<&str> {
        self.master.as_deref()
    }

    /// Names registered in the namespace, in parse order, without duplicates.
    pub fn template_names(&self) -> &[String] {
        &self.names
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    /// Whether this namespace can serve a request with or without master.
    ///
    /// A namespace built with the master also serves standalone renders of
    /// its content, so only a master render needs a master-built entry.
    pub fn covers(&self, use_master: bool) -> bool {
        !use_master || self.master.is_some()
    }

    /// Executes `entry` with `ctx`, streaming output into `out`.
    pub(crate) fn execute(
        &self,
        entry: &str,
        ctx: Value,
        out: &mut dyn Write,
    ) -> Result<(), ViewError> {
        let template = self.env.get_template(entry).map_err(|source| ViewError::Execute {
            name: entry.to_string(),
            source,
        })?;
        template
            .render_captured_to(ctx, out)
            .map(|_| ())
            .map_err(|source| ViewError::Execute {
                name: entry.to_string(),
                source,
            })
    }
}

impl fmt::Debug for ComposedTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComposedTemplate")
            .field("content", &self.content)
            .field("master", &self.master)
            .field("names", &self.names)
            .finish()
    }
}

/// Builds a [`ComposedTemplate`] for `request`.
///
/// Loads every required source through `loader` and parses it into a fresh
/// environment carrying the engine functions and syntax settings.
pub fn compose(
    config: &ViewConfig,
    loader: &dyn ContentLoader,
    request: &RenderRequest,
) -> Result<ComposedTemplate, ViewError> {
    let master = request
        .wants_master(config)
        .then(|| config.master.clone());

    let mut env = Environment::new();
    env.set_syntax(config.delimiters.syntax()?);
    if config.strict_undefined {
        env.set_undefined_behavior(UndefinedBehavior::Strict);
    }
    let escape = default_auto_escape_callback(&format!("view{}", config.extension));
    env.set_auto_escape_callback(move |_| escape.clone());
    config.functions.install(&mut env);

    let mut order: Vec<&str> = Vec::with_capacity(config.partials.len() + 2);
    if let Some(master) = &master {
        order.push(master);
    }
    order.push(&request.name);
    order.extend(config.partials.iter().map(String::as_str));

    let mut names: Vec<String> = Vec::with_capacity(order.len() + 1);
    for name in order {
        let source = loader.load(config, name)?;

        add_source(&mut env, &mut names, name, &source)?;
        if master.is_some() && name == request.name && !config.content_slot.is_empty() {
            add_source(&mut env, &mut names, &config.content_slot, &source)?;
        }
    }

    tracing::debug!(
        content = %request.name,
        master = master.as_deref().unwrap_or(""),
        templates = names.len(),
        "composed template namespace"
    );

    Ok(ComposedTemplate {
        env,
        content: request.name.clone(),
        master,
        names,
    })
}

fn add_source(
    env: &mut Environment<'static>,
    names: &mut Vec<String>,
    name: &str,
    source: &str,
) -> Result<(), ViewError> {
    env.add_template_owned(name.to_string(), source.to_string())
        .map_err(|source| ViewError::Parse {
            name: name.to_string(),
            source,
        })?;
    if !names.iter().any(|n| n == name) {
        names.push(name.to_string());
    }
    Ok(())
}
