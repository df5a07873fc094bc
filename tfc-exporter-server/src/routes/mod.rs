use axum::{Router, middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::{
    handlers::{landing, metrics},
    infra::{app_state::AppState, telemetry::instrument_handler},
};

/// `/metrics` runs a scrape, `/` serves the landing page.
pub fn create_router(state: AppState) -> Router {
    let metrics_route = Router::new()
        .route("/metrics", get(metrics::metrics_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            instrument_handler,
        ));

    Router::new()
        .merge(metrics_route)
        .route("/", get(landing::landing_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
