use axum::http::{Method, header};
use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{
    get_quote, health_handler, list_quotes, method_not_allowed, metrics_handler, not_found,
    preflight, random_quote,
};
use crate::middleware::rate_limit_middleware;
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        .route("/api/quotes", get(list_quotes).options(preflight))
        .route("/api/quotes/random", get(random_quote).options(preflight))
        .route("/api/quotes/{id}", get(get_quote).options(preflight));

    let health_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler));

    let cors_layer = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    Router::new()
        .merge(api_routes)
        .merge(health_routes)
        .fallback(not_found)
        .method_not_allowed_fallback(method_not_allowed)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
