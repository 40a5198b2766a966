//! Router assembly and cross-cutting middleware.

mod account;
mod common;
mod stuff;

pub use account::account_routes;
pub use common::common_routes_with_ready;
pub use stuff::stuff_routes;

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    error_handling::HandleErrorLayer,
    http::{header, StatusCode, Uri},
    middleware::map_response,
    response::{IntoResponse, Response},
    Router,
};
use tower::{timeout::error::Elapsed, BoxError, ServiceBuilder};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

/// Full application: common, account and stuff routes under a request timeout,
/// a body size limit and HTTP tracing. Every error answer uses the envelope.
pub fn build_router(state: AppState) -> Router {
    let timeout = state.config.request_timeout;
    let body_limit = state.config.body_limit_bytes;
    Router::new()
        .merge(common_routes_with_ready(state.clone()))
        .merge(account_routes(state.clone()))
        .merge(stuff_routes(state))
        .fallback(route_not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(HandleErrorLayer::new(middleware_error))
                .timeout(timeout)
                .layer(RequestBodyLimitLayer::new(body_limit)),
        )
        .layer(map_response(envelope_bare_errors))
}

async fn route_not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("No route for {}", uri.path()))
}

/// Rewrites the bodyless 405 and plain-text 413 answers that axum and
/// tower-http produce on their own into the error envelope.
async fn envelope_bare_errors(resp: Response) -> Response {
    let is_json = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"));
    if is_json {
        return resp;
    }
    match resp.status() {
        StatusCode::METHOD_NOT_ALLOWED => {
            let allow = resp.headers().get(header::ALLOW).cloned();
            let mut replaced = AppError::MethodNotAllowed.into_response();
            if let Some(allow) = allow {
                replaced.headers_mut().insert(header::ALLOW, allow);
            }
            replaced
        }
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge.into_response(),
        _ => resp,
    }
}

async fn middleware_error(err: BoxError) -> AppError {
    if err.is::<Elapsed>() {
        AppError::Timeout
    } else {
        AppError::Internal(err.to_string())
    }
}
