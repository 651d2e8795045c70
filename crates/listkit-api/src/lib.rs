//! HTTP surface for the actions: one router, mounted under `/allow-list` and
//! `/poll-action`, plus a health probe.

pub mod error;
pub mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use listkit_core::AppState;
use tower_http::trace::TraceLayer;

pub fn build_router() -> Router<AppState> {
    Router::new()
        .route("/healthz", get(routes::health::healthz))
        .route("/allow-list/metadata", get(routes::allow_list::metadata))
        .route(
            "/allow-list/interactions",
            post(routes::allow_list::handle_interaction),
        )
        .route(
            "/allow-list/interactions/{id}",
            get(routes::allow_list::get_interaction),
        )
        .route("/poll-action/metadata", get(routes::poll::metadata))
        .route(
            "/poll-action/interactions",
            post(routes::poll::handle_interaction),
        )
        .route(
            "/poll-action/interactions/{id}",
            get(routes::poll::get_interaction),
        )
        .layer(TraceLayer::new_for_http())
}
