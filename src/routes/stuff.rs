//! Stuff CRUD routes.

use crate::handlers::stuff::{create, delete as delete_handler, list, read, update};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn stuff_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/stuff", get(list).post(create))
        .route(
            "/api/stuff/:item_id",
            get(read).put(update).delete(delete_handler),
        )
        .with_state(state)
}
