mod catalog;
mod config;
mod error;
mod routes;
mod storage;


use std::path::Path;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{response::Html, routing::get, Router};
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use catalog::Catalog;
use config::Config;
use error::AppError;
use routes::AppState;
use storage::RouteStorage;

/// Build a cache-controlled static file router.
///
/// Separated so tests can exercise the caching layer with arbitrary directories.
fn cached_static_router(dir: &Path, cache_header: &'static str) -> Router {
    let layer = SetResponseHeaderLayer::overriding(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(cache_header),
    );
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(layer)
}

const CACHE_1DAY: &str = "public, max-age=86400, must-revalidate";
const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Build the full application router.
fn build_app(state: AppState, assets_dir: &Path) -> Router {
    let static_files = Router::new()
        .nest("/static", cached_static_router(assets_dir, CACHE_1DAY))
        .nest(
            "/dist",
            cached_static_router(Path::new("dist"), CACHE_IMMUTABLE),
        )
        .nest(
            "/assets",
            cached_static_router(Path::new("dist/assets"), CACHE_IMMUTABLE),
        );

    // Client-side routes all load the same bundle
    let pages = Router::new()
        .route("/", get(serve_index))
        .route("/navigate", get(serve_index))
        .route("/history", get(serve_index))
        .route("/favorites", get(serve_index))
        .route("/account", get(serve_index));

    routes::api_router(state)
        .merge(pages)
        .merge(static_files)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Err(e) = run().await {
        error!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let config = Config::load()?;

    let catalog = Arc::new(Catalog::load(&config.assets_dir)?);

    if let Some(parent) = config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let storage = RouteStorage::open(&config.db_path)?;

    let app = build_app(AppState { catalog, storage }, &config.assets_dir);

    let address = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&address).await?;
    info!("Server running at http://localhost:{}", config.port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

async fn serve_index() -> Html<String> {
    // Try to serve the built frontend, fall back to a simple message
    match std::fs::read_to_string("dist/index.html") {
        Ok(html) => Html(html),
        Err(_) => Html(
            r#"<!DOCTYPE html>
<html>
<head><title>Food Tour Navigator</title></head>
<body>
<h1>Food Tour Navigator</h1>
<p>Frontend not built yet. The route API is available under <a href="/api/health">/api</a>.</p>
</body>
</html>"#
                .to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    /// Build a test app that serves files from the given temp directories.
    fn test_app(assets_dir: &Path, dist_dir: &Path, dist_assets_dir: &Path) -> Router {
        Router::new()
            .nest("/static", cached_static_router(assets_dir, CACHE_1DAY))
            .nest("/dist", cached_static_router(dist_dir, CACHE_IMMUTABLE))
            .nest(
                "/assets",
                cached_static_router(dist_assets_dir, CACHE_IMMUTABLE),
            )
    }

    /// Create a temp dir with a test file and return the dir path.
    fn temp_dir_with_file(file_name: &str, content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(file_name), content).unwrap();
        dir
    }

    async fn get_uri(app: Router, uri: &str) -> axum::response::Response {
        app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_static_catalog_has_1day_cache() {
        let assets_dir = temp_dir_with_file("restaurants.json", "[]");
        let dist_dir = temp_dir_with_file("index.html", "<html></html>");
        let dist_assets_dir = temp_dir_with_file("app.js", "console.log()");

        let app = test_app(assets_dir.path(), dist_dir.path(), dist_assets_dir.path());
        let resp = get_uri(app, "/static/restaurants.json").await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("cache-control").unwrap(),
            "public, max-age=86400, must-revalidate"
        );
    }

    #[tokio::test]
    async fn test_dist_bundles_have_immutable_cache() {
        let assets_dir = temp_dir_with_file("restaurants.json", "[]");
        let dist_dir = temp_dir_with_file("app-abc123.js", "bundle()");
        let dist_assets_dir = temp_dir_with_file("style.css", "body{}");

        let app = test_app(assets_dir.path(), dist_dir.path(), dist_assets_dir.path());
        let resp = get_uri(app, "/dist/app-abc123.js").await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("cache-control").unwrap(),
            "public, max-age=31536000, immutable"
        );
    }

    #[tokio::test]
    async fn test_missing_static_file_returns_404() {
        let assets_dir = temp_dir_with_file("restaurants.json", "[]");
        let dist_dir = temp_dir_with_file("index.html", "<html></html>");
        let dist_assets_dir = temp_dir_with_file("app.js", "");

        let app = test_app(assets_dir.path(), dist_dir.path(), dist_assets_dir.path());
        let resp = get_uri(app, "/static/nonexistent.txt").await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_spa_routes_serve_index() {
        let dir = tempfile::tempdir().unwrap();
        let state = AppState {
            catalog: Arc::new(catalog::tests::sample()),
            storage: RouteStorage::open(&dir.path().join("route.redb")).unwrap(),
        };
        let app = build_app(state, dir.path());

        for uri in ["/", "/navigate", "/history", "/favorites", "/account"] {
            let resp = get_uri(app.clone(), uri).await;
            assert_eq!(resp.status(), StatusCode::OK, "{uri}");
            let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
            assert!(String::from_utf8_lossy(&body).contains("<html"), "{uri}");
        }
    }
}
