//! Persistence seam: users, items, ownership and sessions.
//!
//! Every method that touches more than one row is atomic: it either applies
//! all of its writes or none of them.

mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::{ensure_database_exists, PgStore};

use crate::error::AppError;
use crate::model::{Item, ItemFields, Session, SessionUser, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[async_trait]
pub trait Store: Send + Sync {
    fn backend(&self) -> &'static str;

    /// Cheap round trip used by readiness checks.
    async fn ping(&self) -> Result<(), AppError>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;

    /// Insert a user; `AppError::Conflict` when the username is taken.
    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<i32, AppError>;

    /// Issue a session for `user_id`. `replaces`, when it belongs to the same
    /// user, is deleted in the same unit of work. Expired sessions of every user
    /// are purged as well.
    async fn create_session(
        &self,
        user_id: i32,
        replaces: Option<Uuid>,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, AppError>;

    /// Live (unexpired) session and the account it belongs to.
    async fn resolve_session(&self, session_id: Uuid) -> Result<Option<SessionUser>, AppError>;

    async fn delete_session(&self, session_id: Uuid) -> Result<bool, AppError>;

    /// Items owned by `owner_id`, ordered by item id.
    async fn list_items(&self, owner_id: i32) -> Result<Vec<Item>, AppError>;

    async fn get_item(&self, owner_id: i32, item_id: i32) -> Result<Option<Item>, AppError>;

    /// Insert the item and its ownership row. `AppError::Conflict` when the owner
    /// already has an item with the same name.
    async fn create_item(&self, owner_id: i32, fields: &ItemFields) -> Result<Item, AppError>;

    /// Full replace of an owned item. `Ok(None)` when the owner has no such item;
    /// `AppError::Conflict` when another owned item already uses the new name.
    async fn update_item(
        &self,
        owner_id: i32,
        item_id: i32,
        fields: &ItemFields,
    ) -> Result<Option<Item>, AppError>;

    /// Remove the ownership row and the item. `Ok(false)` (nothing removed) when
    /// the owner has no such item.
    async fn delete_item(&self, owner_id: i32, item_id: i32) -> Result<bool, AppError>;
}

pub(crate) fn duplicate_name(name: &str) -> AppError {
    AppError::Conflict(format!("Item Name {} already exists", name))
}

pub(crate) fn duplicate_username(name: &str) -> AppError {
    AppError::Conflict(format!("Username {} is already in use", name))
}
