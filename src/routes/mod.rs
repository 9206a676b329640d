//! Router assembly.

mod common;
mod entity;
pub use common::common_routes_with_ready;
pub use entity::entity_routes;

use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Request bodies above this are rejected before reaching a handler.
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Full application: common routes at the root, table routes under `/api`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .nest("/api", entity_routes(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
