//! In-memory backends for tests and ephemeral runs.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AppError, Result};
use crate::models::Item;

use super::{ItemStore, ScrapeQueue, ScrapeTask, SearchIndex};

/// In-memory item store backed by two id-keyed maps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    live: HashMap<String, Item>,
    archived: HashMap<String, Item>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live items.
    pub fn live_count(&self) -> usize {
        self.lock().live.len()
    }

    /// Number of archived items.
    pub fn archived_count(&self) -> usize {
        self.lock().archived.len()
    }

    /// Fetch an archived item by id.
    pub fn archived(&self, item_id: &str) -> Option<Item> {
        self.lock().archived.get(item_id).cloned()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("store mutex poisoned")
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn find_by_native_url(&self, native_url: &str) -> Result<Option<Item>> {
        Ok(self
            .lock()
            .live
            .values()
            .find(|item| item.native_url == native_url)
            .cloned())
    }

    async fn get(&self, item_id: &str) -> Result<Option<Item>> {
        let inner = self.lock();
        Ok(inner
            .live
            .get(item_id)
            .or_else(|| inner.archived.get(item_id))
            .cloned())
    }

    async fn exists(&self, item_id: &str) -> Result<bool> {
        let inner = self.lock();
        Ok(inner.live.contains_key(item_id) || inner.archived.contains_key(item_id))
    }

    async fn create(&self, item: &Item) -> Result<()> {
        let mut inner = self.lock();
        if inner.live.contains_key(&item.item_id) || inner.archived.contains_key(&item.item_id) {
            return Err(AppError::conflict(format!(
                "item id {} already exists",
                item.item_id
            )));
        }
        if inner
            .live
            .values()
            .any(|existing| existing.native_url == item.native_url)
        {
            return Err(AppError::conflict(format!(
                "native URL {} already has a live item",
                item.native_url
            )));
        }
        inner.live.insert(item.item_id.clone(), item.clone());
        Ok(())
    }

    async fn update(&self, item: &Item) -> Result<()> {
        let mut inner = self.lock();
        if !inner.live.contains_key(&item.item_id) {
            return Err(AppError::conflict(format!(
                "cannot update unknown item {}",
                item.item_id
            )));
        }
        inner.live.insert(item.item_id.clone(), item.clone());
        Ok(())
    }

    async fn archive(&self, item: &Item) -> Result<()> {
        let mut inner = self.lock();
        inner.live.remove(&item.item_id);
        inner.archived.insert(item.item_id.clone(), item.clone());
        Ok(())
    }
}

/// In-memory search index; remembers which items are indexed.
#[derive(Debug, Default)]
pub struct MemorySearchIndex {
    docs: Mutex<HashMap<String, String>>,
}

impl MemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if this item is currently indexed.
    pub fn contains(&self, item_id: &str) -> bool {
        self.docs
            .lock()
            .expect("index mutex poisoned")
            .contains_key(item_id)
    }

    /// The stored searchable string of an indexed item.
    pub fn searchable(&self, item_id: &str) -> Option<String> {
        self.docs
            .lock()
            .expect("index mutex poisoned")
            .get(item_id)
            .cloned()
    }
}

#[async_trait]
impl SearchIndex for MemorySearchIndex {
    async fn index(&self, item: &Item) -> Result<()> {
        self.docs
            .lock()
            .expect("index mutex poisoned")
            .insert(item.item_id.clone(), item.searchable_string.clone());
        Ok(())
    }

    async fn remove(&self, item_id: &str) -> Result<()> {
        self.docs
            .lock()
            .expect("index mutex poisoned")
            .remove(item_id);
        Ok(())
    }
}

/// In-memory scrape queue.
#[derive(Debug, Default)]
pub struct MemoryQueue {
    tasks: Mutex<Vec<ScrapeTask>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the queued tasks, in enqueue order.
    pub fn tasks(&self) -> Vec<ScrapeTask> {
        self.tasks.lock().expect("queue mutex poisoned").clone()
    }
}

#[async_trait]
impl ScrapeQueue for MemoryQueue {
    async fn enqueue(&self, task: ScrapeTask) -> Result<()> {
        self.tasks.lock().expect("queue mutex poisoned").push(task);
        Ok(())
    }
}
