//! Router-level tests: handlers render through the engine attached to
//! their route, or through the default engine.

use axum::body::{to_bytes, Body};
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serial_test::serial;
use tower::ServiceExt;
use tplview::{context, instance, Engine, MemoryLoader, ViewConfig, HTML_CONTENT_TYPE};
use tplview_axum::{layer, View, Views};

fn frontend() -> Engine {
    let loader = MemoryLoader::new()
        .with("layouts/master", "<front>{% include \"content\" %}</front>")
        .with("index", "<h1>{{ title }}</h1>")
        .with("page", "<p>page</p>");
    Engine::with_loader(ViewConfig::default(), loader)
}

fn backend() -> Engine {
    let loader = MemoryLoader::new()
        .with("layouts/master", "<admin>{% include \"content\" %}</admin>")
        .with("index", "<h1>{{ title }}</h1>");
    Engine::with_loader(ViewConfig::default(), loader)
}

async fn index(views: Views) -> View {
    views.html(StatusCode::OK, "index", &context! { title => "Home" })
}

async fn page(views: Views) -> View {
    views.html(StatusCode::OK, "page.html", &context! {})
}

async fn missing(views: Views) -> View {
    views.html(StatusCode::OK, "nowhere", &context! {})
}

async fn created(views: Views) -> View {
    views.html(StatusCode::CREATED, "index", &context! { title => "New" })
}

fn app() -> Router {
    let admin = Router::new()
        .route("/", get(index))
        .layer(axum::Extension(backend()));

    Router::new()
        .route("/", get(index))
        .route("/page", get(page))
        .route("/missing", get(missing))
        .route("/created", get(created))
        .nest("/admin", admin)
        .layer(axum::Extension(frontend()))
}

async fn get_path(app: Router, path: &str) -> Response {
    app.oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn renders_with_master_and_html_content_type() {
    let response = get_path(app(), "/").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], HTML_CONTENT_TYPE);
    assert_eq!(body_text(response).await, "<front><h1>Home</h1></front>");
}

#[tokio::test]
async fn file_name_renders_without_master() {
    let response = get_path(app(), "/page").await;
    assert_eq!(body_text(response).await, "<p>page</p>");
}

#[tokio::test]
async fn status_is_passed_through() {
    let response = get_path(app(), "/created").await;
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(body_text(response).await, "<front><h1>New</h1></front>");
}

#[tokio::test]
async fn nested_routes_use_their_own_engine() {
    let response = get_path(app(), "/admin").await;
    assert_eq!(body_text(response).await, "<admin><h1>Home</h1></admin>");
}

#[tokio::test]
async fn render_failure_is_a_500_diagnostic() {
    let response = get_path(app(), "/missing").await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.headers()[CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/plain"));
    let body = body_text(response).await;
    assert!(body.starts_with("Render nowhere error: "), "{}", body);
    assert!(body.ends_with('!'));
}

#[tokio::test]
#[serial]
async fn falls_back_to_default_engine() {
    instance::use_engine(backend());

    let app = Router::new().route("/", get(index));
    let response = get_path(app, "/").await;
    assert_eq!(body_text(response).await, "<admin><h1>Home</h1></admin>");

    instance::reset_default_engine();
}

#[tokio::test]
async fn layer_builds_engine_from_config() {
    let dir = tempfile::TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join("layouts")).unwrap();
    std::fs::write(
        dir.path().join("layouts/master.html"),
        "<disk>{% include \"content\" %}</disk>",
    )
    .unwrap();
    std::fs::write(dir.path().join("index.html"), "{{ title }}").unwrap();

    let app = Router::new()
        .route("/", get(index))
        .layer(layer(ViewConfig::default().with_root(dir.path())));
    let response = get_path(app, "/").await;
    assert_eq!(body_text(response).await, "<disk>Home</disk>");
}

#[test]
fn engine_under_joins_default_root() {
    let engine = tplview_axum::engine_under("site");
    assert_eq!(engine.config().root, std::path::Path::new("site").join("views"));
}
