//! In-process store with the same semantics as `PgStore`. One lock guards all
//! tables, so every method is atomic.

use super::{duplicate_name, duplicate_username, Store};
use crate::error::AppError;
use crate::model::{Item, ItemFields, Session, SessionUser, User};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    items: BTreeMap<i32, Item>,
    /// item id -> owner id
    owners: BTreeMap<i32, i32>,
    sessions: HashMap<Uuid, Session>,
    next_user_id: i32,
    next_item_id: i32,
}

impl Tables {
    fn owned_by(&self, owner_id: i32) -> impl Iterator<Item = &Item> {
        self.owners
            .iter()
            .filter(move |(_, owner)| **owner == owner_id)
            .filter_map(move |(item_id, _)| self.items.get(item_id))
    }

    fn name_taken(&self, owner_id: i32, name: &str, except: Option<i32>) -> bool {
        self.owned_by(owner_id)
            .any(|i| i.item_name == name && Some(i.item_id) != except)
    }

    fn is_owner(&self, owner_id: i32, item_id: i32) -> bool {
        self.owners.get(&item_id) == Some(&owner_id)
    }

    fn require_user(&self, user_id: i32) -> Result<(), AppError> {
        if self.users.contains_key(&user_id) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("Can't find user {}", user_id)))
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn item_count(&self) -> usize {
        self.tables.lock().await.items.len()
    }

    pub async fn session_count(&self) -> usize {
        self.tables.lock().await.sessions.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let t = self.tables.lock().await;
        Ok(t.users.values().find(|u| u.username == username).cloned())
    }

    async fn insert_user(&self, username: &str, password_hash: &str) -> Result<i32, AppError> {
        let mut t = self.tables.lock().await;
        if t.users.values().any(|u| u.username == username) {
            return Err(duplicate_username(username));
        }
        t.next_user_id += 1;
        let user_id = t.next_user_id;
        t.users.insert(
            user_id,
            User {
                user_id,
                username: username.to_string(),
                password_hash: password_hash.to_string(),
            },
        );
        Ok(user_id)
    }

    async fn create_session(
        &self,
        user_id: i32,
        replaces: Option<Uuid>,
        expires_at: DateTime<Utc>,
    ) -> Result<Session, AppError> {
        let mut t = self.tables.lock().await;
        t.require_user(user_id)?;
        if let Some(old) = replaces {
            if t.sessions.get(&old).is_some_and(|s| s.user_id == user_id) {
                t.sessions.remove(&old);
            }
        }
        let now = Utc::now();
        t.sessions.retain(|_, s| s.expires_at > now);
        let session = Session {
            session_id: Uuid::new_v4(),
            user_id,
            expires_at,
        };
        t.sessions.insert(session.session_id, session.clone());
        Ok(session)
    }

    async fn resolve_session(&self, session_id: Uuid) -> Result<Option<SessionUser>, AppError> {
        let t = self.tables.lock().await;
        let now = Utc::now();
        Ok(t.sessions
            .get(&session_id)
            .filter(|s| s.expires_at > now)
            .and_then(|s| t.users.get(&s.user_id))
            .map(|u| SessionUser {
                session_id,
                user_id: u.user_id,
                username: u.username.clone(),
            }))
    }

    async fn delete_session(&self, session_id: Uuid) -> Result<bool, AppError> {
        Ok(self.tables.lock().await.sessions.remove(&session_id).is_some())
    }

    async fn list_items(&self, owner_id: i32) -> Result<Vec<Item>, AppError> {
        let t = self.tables.lock().await;
        Ok(t.owned_by(owner_id).cloned().collect())
    }

    async fn get_item(&self, owner_id: i32, item_id: i32) -> Result<Option<Item>, AppError> {
        let t = self.tables.lock().await;
        if !t.is_owner(owner_id, item_id) {
            return Ok(None);
        }
        Ok(t.items.get(&item_id).cloned())
    }

    async fn create_item(&self, owner_id: i32, fields: &ItemFields) -> Result<Item, AppError> {
        let mut t = self.tables.lock().await;
        t.require_user(owner_id)?;
        if t.name_taken(owner_id, &fields.item_name, None) {
            return Err(duplicate_name(&fields.item_name));
        }
        t.next_item_id += 1;
        let item = Item::from_fields(t.next_item_id, fields);
        t.items.insert(item.item_id, item.clone());
        t.owners.insert(item.item_id, owner_id);
        Ok(item)
    }

    async fn update_item(
        &self,
        owner_id: i32,
        item_id: i32,
        fields: &ItemFields,
    ) -> Result<Option<Item>, AppError> {
        let mut t = self.tables.lock().await;
        t.require_user(owner_id)?;
        if !t.is_owner(owner_id, item_id) {
            return Ok(None);
        }
        if t.name_taken(owner_id, &fields.item_name, Some(item_id)) {
            return Err(duplicate_name(&fields.item_name));
        }
        let item = Item::from_fields(item_id, fields);
        t.items.insert(item_id, item.clone());
        Ok(Some(item))
    }

    async fn delete_item(&self, owner_id: i32, item_id: i32) -> Result<bool, AppError> {
        let mut t = self.tables.lock().await;
        if !t.is_owner(owner_id, item_id) {
            return Ok(false);
        }
        t.owners.remove(&item_id);
        t.items.remove(&item_id);
        Ok(true)
    }
}
