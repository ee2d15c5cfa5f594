// rates-core/src/api/mod.rs
// HTTP surface over RatesService

pub mod dto;
pub mod error;
pub mod handlers;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::service::RatesService;
pub use error::ApiError;
pub use handlers::AppState;

pub fn router(service: Arc<RatesService>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_origin(Any);

    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/coins/actual", post(handlers::actual_rates))
        .route("/coins/aggregate/:agg_func", post(handlers::aggregate_rates));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { service })
}
