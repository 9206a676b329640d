//! Table CRUD routes. The table, key column and key value come from the path.

use crate::handlers::entity::{create, delete as delete_handler, list, read, update, verify_password};
use crate::state::AppState;
use axum::{routing::get, routing::post, Router};

pub fn entity_routes(state: AppState) -> Router {
    Router::new()
        .route("/:table", get(list).post(create))
        .route("/:table/verificar-contrasena", post(verify_password))
        .route(
            "/:table/:key/:value",
            get(read).put(update).delete(delete_handler),
        )
        .with_state(state)
}
