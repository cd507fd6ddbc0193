//! Storage abstractions for catalog items and their collaborators.
//!
//! The curation/tagging core never talks to a concrete backend: items are
//! persisted through [`ItemStore`], searchability is maintained through
//! [`SearchIndex`] and re-scrape requests go through [`ScrapeQueue`]. Two
//! reference backends ship in-crate: mutex-guarded in-memory maps for tests
//! and ephemeral runs, and JSON files under a data directory for local
//! deployments.

pub mod local;
pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Item;

// Re-export for convenience
pub use local::{FileQueue, LocalSearchIndex, LocalStore};
pub use memory::{MemoryQueue, MemorySearchIndex, MemoryStore};

/// A request to re-fetch a listing in full.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeTask {
    /// Source marketplace identifier
    pub source: String,

    /// URL to scrape
    pub native_url: String,

    /// Opaque scraper state from the shallow pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraper_data: Option<String>,
}

/// Persistent store for live and archived catalog items.
///
/// Invariant: at most one live item per native URL, and a live and an
/// archived item for the same native URL are mutually exclusive.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Look up the live item derived from this native URL, if any.
    async fn find_by_native_url(&self, native_url: &str) -> Result<Option<Item>>;

    /// Fetch an item by id, from the live store or the archive.
    async fn get(&self, item_id: &str) -> Result<Option<Item>>;

    /// True if this item id is taken, live or archived.
    async fn exists(&self, item_id: &str) -> Result<bool>;

    /// Insert a new live item. Fails with a conflict when the native URL
    /// already has a live item (this is what makes the concurrent-create
    /// race detectable).
    async fn create(&self, item: &Item) -> Result<()>;

    /// Overwrite an existing live item.
    async fn update(&self, item: &Item) -> Result<()>;

    /// Move an item from the live store into the archive.
    async fn archive(&self, item: &Item) -> Result<()>;
}

/// Full-text index over live items.
#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Index (or re-index) an item.
    async fn index(&self, item: &Item) -> Result<()>;

    /// Drop an item from the index.
    async fn remove(&self, item_id: &str) -> Result<()>;
}

/// Queue of listings awaiting a deeper scrape.
#[async_trait]
pub trait ScrapeQueue: Send + Sync {
    /// Enqueue a scrape task.
    async fn enqueue(&self, task: ScrapeTask) -> Result<()>;
}
