//! Standard response envelope helpers: `{success}` merged with a payload or an `errorMessage`.

use crate::model::Item;
use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

#[derive(Serialize)]
pub struct ItemBody {
    pub item: Item,
}

#[derive(Serialize)]
pub struct ItemsBody {
    pub items: Vec<Item>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeBody {
    pub welcome_text: &'static str,
}

pub fn success<T: Serialize>(status: StatusCode, body: T) -> (StatusCode, Json<Envelope<T>>) {
    (status, Json(Envelope { success: true, body }))
}

pub fn success_ok<T: Serialize>(body: T) -> (StatusCode, Json<Envelope<T>>) {
    success(StatusCode::OK, body)
}

pub fn success_created<T: Serialize>(body: T) -> (StatusCode, Json<Envelope<T>>) {
    success(StatusCode::CREATED, body)
}

pub fn error_body(message: String) -> serde_json::Value {
    serde_json::json!({
        "success": false,
        "errorMessage": message,
    })
}
