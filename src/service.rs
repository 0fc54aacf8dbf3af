/// Rule-list service: the single owner of the persisted line items.
///
/// Every operation reads the whole list from the store, changes a copy and
/// writes the whole list back, then re-reads once to confirm. Operations on
/// one service are serialized through the cache mutex, so two callers can't
/// interleave a read-modify-write and lose each other's changes.
use crate::line_item::{LineItem, LineItemEdit};
use crate::store::{KeyValueStore, StoreError};
use futures::lock::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const DEFAULT_STORAGE_KEY: &str = "lineItems";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceConfig {
    /// Store key the list lives under
    pub storage_key: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("reading line items failed: {0}")]
    StoreReadFailed(StoreError),

    #[error("writing line items failed: {0}")]
    StoreWriteFailed(StoreError),

    #[error("stored line items are malformed: {0}")]
    Malformed(serde_json::Error),

    #[error("failed to encode line items: {0}")]
    Encode(serde_json::Error),

    #[error("line items were written but read back empty")]
    WriteNotVisible,
}

/// Direction for `move_by_id`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

pub struct LineItemsService<S> {
    store: S,
    config: ServiceConfig,
    line_items: Mutex<Vec<LineItem>>,
}

impl<S: KeyValueStore> LineItemsService<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, ServiceConfig::default())
    }

    pub fn with_config(store: S, config: ServiceConfig) -> Self {
        LineItemsService {
            store,
            config,
            line_items: Mutex::new(Vec::new()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Last list read from or written to the store
    pub async fn cached(&self) -> Vec<LineItem> {
        self.line_items.lock().await.clone()
    }

    /// Stored list, reseeded with one default rule when nothing is stored
    pub async fn get(&self) -> Result<Vec<LineItem>, ServiceError> {
        let mut cache = self.line_items.lock().await;
        self.load(&mut cache).await
    }

    /// Replace everything with a single default rule
    pub async fn reset(&self) -> Result<Vec<LineItem>, ServiceError> {
        let mut cache = self.line_items.lock().await;
        self.reseed(&mut cache).await
    }

    /// Append a default rule
    pub async fn add(&self) -> Result<Vec<LineItem>, ServiceError> {
        let mut cache = self.line_items.lock().await;
        let mut items = self.load(&mut cache).await?;
        let item = LineItem::new_unique(&items);
        log::debug!("Adding line item {}", item.id);
        items.push(item);
        self.persist(&mut cache, items).await
    }

    /// Store `items` verbatim. An empty list is reseeded instead.
    pub async fn set(&self, items: Vec<LineItem>) -> Result<Vec<LineItem>, ServiceError> {
        let mut cache = self.line_items.lock().await;
        if items.is_empty() {
            return self.reseed(&mut cache).await;
        }
        self.persist(&mut cache, items).await
    }

    /// Replace the whole entry matching `id` with `new_state`.
    ///
    /// Fields are not merged. The entry keeps `id` whatever `new_state.id` says.
    /// An unknown id writes the list back unchanged.
    pub async fn update_by_id(
        &self,
        id: i64,
        new_state: LineItem,
    ) -> Result<Vec<LineItem>, ServiceError> {
        let mut cache = self.line_items.lock().await;
        let mut items = self.load(&mut cache).await?;
        match items.iter_mut().find(|item| item.id == id) {
            Some(item) => *item = LineItem { id, ..new_state },
            None => log::debug!("Update for unknown line item {}", id),
        }
        self.persist(&mut cache, items).await
    }

    /// Apply `edit` to the stored entry matching `id`, leaving its other fields alone.
    ///
    /// The edit runs against the list as read under the lock, so edits issued
    /// back to back never undo each other. An unknown id skips the write.
    pub async fn edit_by_id(
        &self,
        id: i64,
        edit: LineItemEdit,
    ) -> Result<Vec<LineItem>, ServiceError> {
        let mut cache = self.line_items.lock().await;
        let mut items = self.load(&mut cache).await?;
        let Some(item) = items.iter_mut().find(|item| item.id == id) else {
            log::warn!("Cannot edit line item {}: not found", id);
            return Ok(items);
        };
        edit.apply(item);
        self.persist(&mut cache, items).await
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<Vec<LineItem>, ServiceError> {
        let mut cache = self.line_items.lock().await;
        let mut items = self.load(&mut cache).await?;
        if items.len() == 1 {
            return self.reseed(&mut cache).await;
        }
        items.retain(|item| item.id != id);
        self.persist(&mut cache, items).await
    }

    /// Swap the entry with its neighbour in `direction`; no-op at either end
    pub async fn move_by_id(
        &self,
        id: i64,
        direction: Direction,
    ) -> Result<Vec<LineItem>, ServiceError> {
        let mut cache = self.line_items.lock().await;
        let mut items = self.load(&mut cache).await?;
        let Some(index) = items.iter().position(|item| item.id == id) else {
            log::warn!("Cannot move line item {}: not found", id);
            return Ok(items);
        };

        match direction {
            Direction::Up if index > 0 => items.swap(index, index - 1),
            Direction::Down if index + 1 < items.len() => items.swap(index, index + 1),
            _ => {}
        }
        self.persist(&mut cache, items).await
    }

    /// Drop every rule the user never edited
    pub async fn cleanup(&self) -> Result<Vec<LineItem>, ServiceError> {
        let mut cache = self.line_items.lock().await;
        let items = self.load(&mut cache).await?;
        let before = items.len();
        let kept: Vec<LineItem> = items
            .into_iter()
            .filter(|item| !item.is_default_equivalent())
            .collect();
        log::debug!("Cleanup removed {} of {} line items", before - kept.len(), before);

        if kept.is_empty() {
            self.reseed(&mut cache).await
        } else {
            self.persist(&mut cache, kept).await
        }
    }

    async fn load(&self, cache: &mut MutexGuard<'_, Vec<LineItem>>) -> Result<Vec<LineItem>, ServiceError> {
        let items = self.read().await?;
        if items.is_empty() {
            log::debug!("No stored line items, seeding a default");
            return self.reseed(cache).await;
        }
        **cache = items.clone();
        Ok(items)
    }

    async fn reseed(&self, cache: &mut MutexGuard<'_, Vec<LineItem>>) -> Result<Vec<LineItem>, ServiceError> {
        self.persist(cache, vec![LineItem::new_default()]).await
    }

    /// Write `items`, then read back what the store actually holds
    async fn persist(
        &self,
        cache: &mut MutexGuard<'_, Vec<LineItem>>,
        items: Vec<LineItem>,
    ) -> Result<Vec<LineItem>, ServiceError> {
        let items = if items.is_empty() {
            log::debug!("Refusing to store an empty list, seeding a default");
            vec![LineItem::new_default()]
        } else {
            items
        };
        let value = serde_json::to_value(&items).map_err(ServiceError::Encode)?;
        self.store
            .set(&self.config.storage_key, value)
            .await
            .map_err(|e| {
                log::error!("Error setting line items: {}", e);
                ServiceError::StoreWriteFailed(e)
            })?;

        let confirmed = self.read().await?;
        if confirmed.is_empty() {
            log::error!("Line items vanished right after being written");
            return Err(ServiceError::WriteNotVisible);
        }
        **cache = confirmed.clone();
        Ok(confirmed)
    }

    async fn read(&self) -> Result<Vec<LineItem>, ServiceError> {
        let stored = self
            .store
            .get(&self.config.storage_key)
            .await
            .map_err(|e| {
                log::error!("Error getting line items: {}", e);
                ServiceError::StoreReadFailed(e)
            })?;

        match stored {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                log::error!("Stored line items are malformed: {}", e);
                ServiceError::Malformed(e)
            }),
        }
    }
}
