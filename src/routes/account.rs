//! Welcome and account routes.

use crate::handlers::account::{login, logout, register, welcome};
use crate::state::AppState;
use axum::{routing::get, routing::post, Router};

pub fn account_routes(state: AppState) -> Router {
    Router::new()
        .route("/api", get(welcome))
        .route("/api/", get(welcome))
        .route("/api/account/register", post(register))
        .route("/api/account/login", post(login))
        .route("/api/account/logout", post(logout))
        .with_state(state)
}
