//! Router assembly: page and JSON endpoints, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - pages `/`, `/home/`, `/challenge/`, `/about/` and the `/results/` form target
/// - JSON endpoints `/predict/`, `/challenge/get_training/`, `/challenge/get_test/`,
///   `/api/results/`, `/health/`
/// - everything mounted under the configured route prefix, including the
///   page scripts and styles under `/js` and `/css`
/// - other static files from the configured directory for anything else
/// - CORS (allow any origin/method/headers) and per-request trace spans
pub fn build_router(state: Arc<AppState>) -> Router {
    let prefix = state.config.route_prefix();
    let static_dir = &state.config.server.static_dir;
    let static_service = ServeDir::new(static_dir);

    let routes = Router::new()
        // Pages
        .route("/", get(http::http_index).post(http::http_index))
        .route("/home/", get(http::http_index).post(http::http_index))
        .route("/about/", get(http::http_about))
        .route("/challenge/", get(http::http_challenge))
        .route("/results/", post(http::http_post_results))
        // JSON API
        .route("/predict/", get(http::http_get_predict).post(http::http_post_predict))
        .route("/challenge/get_training/", get(http::http_get_training))
        .route("/challenge/get_test/", get(http::http_get_test))
        .route("/api/results/", post(http::http_post_api_results))
        .route("/health/", get(http::http_health))
        // Page assets, so they follow the route prefix
        .nest_service("/js", ServeDir::new(static_dir.join("js")))
        .nest_service("/css", ServeDir::new(static_dir.join("css")));

    let app = if prefix.is_empty() { routes } else { Router::new().nest(&prefix, routes) };

    app
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Static assets (scripts, styles) fallback
        .fallback_service(static_service)
}
