//! Session history: the ten most recent translations, newest first.

use crate::error::StorageError;
use crate::models::HistoryItem;
use crate::storage::KeyValueStore;
use std::sync::Arc;
use tracing::{debug, warn};

/// Key holding the serialized history array.
pub const HISTORY_KEY: &str = "linguist_history";

/// Maximum number of entries kept.
pub const HISTORY_LIMIT: usize = 10;

pub struct HistoryStore {
    store: Arc<dyn KeyValueStore>,
    items: Vec<HistoryItem>,
}

impl HistoryStore {
    /// Read persisted history, failing on unreadable data.
    ///
    /// A missing key is an empty history.
    pub fn try_load(store: Arc<dyn KeyValueStore>) -> Result<Self, StorageError> {
        let items = read_items(store.as_ref())?;
        Ok(Self { store, items })
    }

    /// Read persisted history, degrading to empty on corrupt data.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        match read_items(store.as_ref()) {
            Ok(items) => Self { store, items },
            Err(e) => {
                warn!("Ignoring unreadable history: {}", e);
                Self {
                    store,
                    items: Vec::new(),
                }
            }
        }
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&HistoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Prepend `item`, keep the newest [`HISTORY_LIMIT`] entries and persist.
    ///
    /// The in-memory history is updated even when persisting fails.
    pub fn append(&mut self, item: HistoryItem) -> Result<(), StorageError> {
        self.items.insert(0, item);
        self.items.truncate(HISTORY_LIMIT);
        debug!("History now holds {} items", self.items.len());
        self.persist()
    }

    /// Drop every entry and the persisted copy.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.items.clear();
        self.store.remove(HISTORY_KEY)
    }

    fn persist(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.items)
            .map_err(|e| StorageError::Serialize(e.to_string()))?;
        self.store.set(HISTORY_KEY, &json)
    }
}

fn read_items(store: &dyn KeyValueStore) -> Result<Vec<HistoryItem>, StorageError> {
    match store.get(HISTORY_KEY)? {
        None => Ok(Vec::new()),
        Some(raw) => {
            serde_json::from_str(&raw).map_err(|e| StorageError::CorruptPersistedState {
                key: HISTORY_KEY.to_string(),
                reason: e.to_string(),
            })
        }
    }
}
