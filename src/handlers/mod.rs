//! HTTP handlers for accounts and stuff items.

pub mod account;
pub mod stuff;

use crate::error::AppError;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

/// Unwrap a JSON body, reporting malformed input through the error envelope.
fn json_body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    payload
        .map(|Json(v)| v)
        .map_err(|rejection| match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge,
            _ => AppError::Validation(rejection.body_text()),
        })
}
