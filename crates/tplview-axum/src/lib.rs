//! # tplview-axum - tplview Views for axum
//!
//! Renders [`tplview`] pages as axum responses.
//!
//! - [`View`]: a page to render, returned from handlers as `impl IntoResponse`
//! - [`Views`]: extractor for the engine attached to the current route
//! - [`layer`]: attaches an engine to a router or route group
//!
//! Handlers extract [`Views`] and call [`Views::html`]. The engine comes
//! from the request extensions when a [`layer`] is installed on the route,
//! and from [`tplview::instance::default_engine`] otherwise, so one
//! application can serve a frontend and an admin area from two view trees:
//!
//! ```rust,no_run
//! use axum::{http::StatusCode, routing::get, Router};
//! use tplview::{context, ViewConfig};
//! use tplview_axum::{layer, Views};
//!
//! async fn index(views: Views) -> tplview_axum::View {
//!     views.html(StatusCode::OK, "index", &context! { title => "Home" })
//! }
//!
//! let admin = Router::new()
//!     .route("/", get(index))
//!     .layer(layer(ViewConfig::default().with_root("views/backend")));
//!
//! let app: Router = Router::new().route("/", get(index)).nest("/admin", admin);
//! ```
//!
//! A render failure becomes a `500 Internal Server Error` with a short
//! plain-text diagnostic, and is logged at `error` level.

use std::convert::Infallible;
use std::path::Path;

use axum::body::Body;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use serde::Serialize;
use tplview::{instance, BufferedResponse, Engine, Value, ViewConfig, DEFAULT_ROOT};

/// A page render, turned into a response by axum.
///
/// Rendering happens synchronously inside `into_response`. On a cache miss
/// the default [`tplview::FileLoader`] reads template files with blocking
/// IO on the calling executor thread; keep the cache enabled in production,
/// or use a [`tplview::MemoryLoader`] to keep disk reads off the runtime.
#[derive(Debug, Clone)]
pub struct View {
    engine: Engine,
    status: StatusCode,
    name: String,
    data: Value,
}

impl View {
    pub fn new<S: Serialize + ?Sized>(engine: Engine, status: StatusCode, name: &str, data: &S) -> Self {
        Self {
            engine,
            status,
            name: name.to_string(),
            data: Value::from_serialize(data),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for View {
    fn into_response(self) -> Response {
        let mut buffered = BufferedResponse::new();
        if let Err(err) = self
            .engine
            .render(&mut buffered, self.status, &self.name, &self.data)
        {
            tracing::error!(template = %self.name, error = %err, "view render failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Render {} error: {}!", self.name, err),
            )
                .into_response();
        }

        let (status, headers, body) = buffered.into_parts();
        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

/// The engine for the current request.
#[derive(Debug, Clone)]
pub struct Views(pub Engine);

impl Views {
    /// A [`View`] of `name` rendered with `data` at `status`.
    pub fn html<S: Serialize + ?Sized>(&self, status: StatusCode, name: &str, data: &S) -> View {
        View::new(self.0.clone(), status, name, data)
    }

    pub fn engine(&self) -> &Engine {
        &self.0
    }
}

impl<S> FromRequestParts<S> for Views
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let engine = match parts.extensions.get::<Engine>() {
            Some(engine) => engine.clone(),
            None => instance::default_engine(),
        };
        Ok(Views(engine))
    }
}

/// A router layer attaching a new engine built from `config`.
pub fn layer(config: ViewConfig) -> Extension<Engine> {
    Extension(Engine::new(config))
}

/// An engine with the default config, rooted under `base`.
///
/// `engine_under("site")` reads `site/views/*.html`.
pub fn engine_under(base: impl AsRef<Path>) -> Engine {
    Engine::new(ViewConfig::default().with_root(base.as_ref().join(DEFAULT_ROOT)))
}
