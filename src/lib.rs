// Library exports for the API server, the probe binary and tests
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::{http::Method, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use services::comedor::ComedorService;
use services::fetcher::Fetcher;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub comedor: Arc<ComedorService>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, fetcher: Arc<dyn Fetcher>) -> Self {
        let comedor = ComedorService::new(fetcher, config.upstream.clone());
        Self {
            comedor: Arc::new(comedor),
            config: Arc::new(config),
        }
    }
}

pub fn app(state: AppState) -> Router {
    // Public, read-only API: any origin may GET.
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_origin(Any);

    Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::metrics::metrics_handler))
        .route("/menu", get(routes::menu::get_menu))
        .route("/servings", get(routes::servings::get_servings))
        .route("/users", get(routes::users::get_users))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
