//! Ownership-scoped item operations. The owner is always the session's user.

use crate::error::AppError;
use crate::model::{Item, ItemFields};
use crate::store::Store;

pub const DATA_NOT_FOUND: &str = "Data not found";

pub struct InventoryService;

impl InventoryService {
    /// An empty collection is reported as not found.
    pub async fn list(store: &dyn Store, owner_id: i32) -> Result<Vec<Item>, AppError> {
        let items = store.list_items(owner_id).await?;
        if items.is_empty() {
            return Err(AppError::NotFound(DATA_NOT_FOUND.into()));
        }
        Ok(items)
    }

    pub async fn get(store: &dyn Store, owner_id: i32, item_id: i32) -> Result<Item, AppError> {
        store
            .get_item(owner_id, item_id)
            .await?
            .ok_or_else(|| AppError::NotFound(DATA_NOT_FOUND.into()))
    }

    pub async fn create(store: &dyn Store, owner_id: i32, fields: ItemFields) -> Result<Item, AppError> {
        let item = store.create_item(owner_id, &fields).await?;
        tracing::info!(owner_id, item_id = item.item_id, "item created");
        Ok(item)
    }

    pub async fn update(
        store: &dyn Store,
        owner_id: i32,
        item_id: i32,
        fields: ItemFields,
    ) -> Result<Item, AppError> {
        let item = store
            .update_item(owner_id, item_id, &fields)
            .await?
            .ok_or_else(|| AppError::NotFound(DATA_NOT_FOUND.into()))?;
        tracing::info!(owner_id, item_id, "item replaced");
        Ok(item)
    }

    pub async fn delete(store: &dyn Store, owner_id: i32, item_id: i32) -> Result<(), AppError> {
        if !store.delete_item(owner_id, item_id).await? {
            return Err(AppError::NotFound(format!(
                "Cannot find item id {} to delete",
                item_id
            )));
        }
        tracing::info!(owner_id, item_id, "item deleted");
        Ok(())
    }
}
