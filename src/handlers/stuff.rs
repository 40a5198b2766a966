//! Stuff handlers: list, read, create, replace, delete. All scoped to the session's user.

use super::json_body;
use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::response::{success_created, success_ok, ItemBody, ItemsBody};
use crate::service::{InventoryService, RequestValidator};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    let items = InventoryService::list(state.store.as_ref(), owner.user_id).await?;
    Ok(success_ok(ItemsBody { items }))
}

pub async fn read(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let item_id = RequestValidator::item_id(&id_str)?;
    let item = InventoryService::get(state.store.as_ref(), owner.user_id, item_id).await?;
    Ok(success_ok(ItemBody { item }))
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let fields = RequestValidator::item(&json_body(payload)?)?;
    let item = InventoryService::create(state.store.as_ref(), owner.user_id, fields).await?;
    Ok(success_created(ItemBody { item }))
}

pub async fn update(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    Path(id_str): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let item_id = RequestValidator::item_id(&id_str)?;
    let fields = RequestValidator::item(&json_body(payload)?)?;
    let item = InventoryService::update(state.store.as_ref(), owner.user_id, item_id, fields).await?;
    Ok(success_created(ItemBody { item }))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(owner): CurrentUser,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let item_id = RequestValidator::item_id(&id_str)?;
    InventoryService::delete(state.store.as_ref(), owner.user_id, item_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
