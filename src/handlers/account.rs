//! Account handlers: welcome, register, login, logout.

use super::json_body;
use crate::error::AppError;
use crate::extractors::{CurrentUser, PriorSession};
use crate::response::{success_created, success_ok, WelcomeBody};
use crate::service::{AccountService, RequestValidator};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

pub async fn welcome() -> impl IntoResponse {
    success_ok(WelcomeBody {
        welcome_text: "Welcome to the Inventory App",
    })
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let creds = RequestValidator::credentials(&json_body(payload)?)?;
    let grant = AccountService::register(state.store.as_ref(), &state.config, creds).await?;
    Ok(success_created(grant))
}

pub async fn login(
    State(state): State<AppState>,
    PriorSession(prior): PriorSession,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let creds = RequestValidator::credentials(&json_body(payload)?)?;
    let grant = AccountService::login(state.store.as_ref(), &state.config, creds, prior).await?;
    Ok(success_ok(grant))
}

pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(session): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    AccountService::logout(state.store.as_ref(), &session).await?;
    Ok(StatusCode::NO_CONTENT)
}
