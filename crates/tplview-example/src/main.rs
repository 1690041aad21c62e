//! Serves a frontend and an admin area from two view trees.
//!
//! - `/` renders `index` inside the frontend master layout
//! - `/page` renders `page.html` on its own
//! - `/admin` renders the backend `index` with its own engine
//!
//! The frontend engine is installed as the process default; the admin
//! routes carry theirs as a router layer.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use tplview::{context, instance, Engine, Functions, ViewConfig};
use tplview_axum::{layer, View, Views};
use tracing::info;
use tracing_subscriber::EnvFilter;

const RAW_CONTENT: &str = r#"This is <b>HTML</b> content! Posted on <time datetime="2019-05-16 01:02:03">May 16</time>."#;

#[derive(Parser, Debug)]
#[command(name = "tplview-demo")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:9090")]
    addr: SocketAddr,

    /// Directory holding the `frontend` and `backend` view trees
    #[arg(long, default_value = concat!(env!("CARGO_MANIFEST_DIR"), "/views"))]
    views: PathBuf,

    /// Re-read templates on every request
    #[arg(long)]
    no_cache: bool,
}

fn helpers() -> anyhow::Result<Functions> {
    Ok(Functions::new().with("copy", || chrono::Local::now().format("%Y").to_string())?)
}

fn frontend_config(cli: &Cli) -> anyhow::Result<ViewConfig> {
    Ok(ViewConfig::default()
        .with_root(cli.views.join("frontend"))
        .with_partials(["layouts/head", "layouts/footer", "partials/ad"])
        .with_functions(helpers()?)
        .with_disable_cache(cli.no_cache))
}

fn backend_config(cli: &Cli) -> anyhow::Result<ViewConfig> {
    Ok(ViewConfig::default()
        .with_root(cli.views.join("backend"))
        .with_functions(helpers()?)
        .with_disable_cache(cli.no_cache))
}

async fn index(views: Views) -> View {
    views.html(
        StatusCode::OK,
        "index",
        &context! {
            title => "Frontend title!",
            html_content => RAW_CONTENT,
            raw_content => RAW_CONTENT,
        },
    )
}

async fn page(views: Views) -> View {
    views.html(StatusCode::OK, "page.html", &context! { title => "Page file title!!" })
}

async fn admin_index(views: Views) -> View {
    views.html(
        StatusCode::OK,
        "index",
        &context! {
            title => "Backend title!",
            page => "backend",
            user => "kogas",
            station_id => 4,
        },
    )
}

fn router(backend: ViewConfig) -> Router {
    let admin = Router::new()
        .route("/", get(admin_index))
        .layer(layer(backend));

    Router::new()
        .route("/", get(index))
        .route("/page", get(page))
        .nest("/admin", admin)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tplview=debug")),
        )
        .init();

    let cli = Cli::parse();

    instance::use_engine(Engine::new(frontend_config(&cli)?));
    let app = router(backend_config(&cli)?);

    let listener = tokio::net::TcpListener::bind(cli.addr)
        .await
        .with_context(|| format!("Failed to bind {}", cli.addr))?;
    info!(addr = %cli.addr, views = %cli.views.display(), "listening");

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}
