//! Domain records shared by the store, services and handlers.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Registered account. `password_hash` is a bcrypt string and never leaves the server.
#[derive(Clone, Debug)]
pub struct User {
    pub user_id: i32,
    pub username: String,
    pub password_hash: String,
}

/// One inventory row as returned to the owner.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub item_id: i32,
    pub item_name: String,
    pub quantity: Option<i32>,
    pub item_type: Option<String>,
    pub item_value: Option<f64>,
    pub location: Option<String>,
}

/// Validated writable fields of an item. Absent optional fields stay `None`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ItemFields {
    pub item_name: String,
    pub quantity: Option<i32>,
    pub item_type: Option<String>,
    pub item_value: Option<f64>,
    pub location: Option<String>,
}

impl Item {
    pub fn from_fields(item_id: i32, fields: &ItemFields) -> Self {
        Item {
            item_id,
            item_name: fields.item_name.clone(),
            quantity: fields.quantity,
            item_type: fields.item_type.clone(),
            item_value: fields.item_value,
            location: fields.location.clone(),
        }
    }
}

/// Username/password pair after length validation.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

#[derive(Clone, Debug)]
pub struct Session {
    pub session_id: Uuid,
    pub user_id: i32,
    pub expires_at: DateTime<Utc>,
}

/// The account a live session resolves to.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionUser {
    pub session_id: Uuid,
    pub user_id: i32,
    pub username: String,
}

/// Returned from register and login.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionGrant {
    pub user_id: i32,
    pub token: Uuid,
    pub expires_at: DateTime<Utc>,
}
