// HTTP routes: metrics (optionally signed), health, version

mod http;

use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::auth;
use crate::service::MetricsService;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) service: Arc<MetricsService>,
    pub(crate) secret: Option<Arc<str>>,
}

/// Build the router. With `secret` set, `/metrics` requires a valid HMAC signature.
pub fn app(service: Arc<MetricsService>, secret: Option<String>) -> Router {
    let state = AppState {
        service,
        secret: secret.map(Arc::from),
    };
    let metrics = Router::new()
        .route("/metrics", get(http::metrics_handler)) // GET /metrics
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_signature,
        ));
    Router::new()
        .merge(metrics)
        .route("/health", get(http::health_handler)) // GET /health
        .route("/version", get(http::version_handler)) // GET /version
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
