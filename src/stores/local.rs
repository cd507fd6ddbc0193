//! Local filesystem backends.
//!
//! A JSON-file rendition of the store interfaces for development and small
//! deployments. Live items sit in `items.json` (hot, rewritten on every
//! mutation); archived items rotate into `archive/YYYY/MM.json` (cold,
//! partitioned by the month the listing ended). Writes go through a temp
//! file followed by a rename.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── items.json            # Hot: live items
//! ├── index.json            # Inverted index over searchable strings
//! ├── queue.json            # Pending scrape tasks
//! └── archive/              # Cold: ended items
//!     └── YYYY/
//!         └── MM.json
//! ```

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use unicode_segmentation::UnicodeSegmentation;

use crate::error::{AppError, Result};
use crate::models::Item;

use super::{ItemStore, ScrapeQueue, ScrapeTask, SearchIndex};

/// Shared JSON-file plumbing rooted at a directory.
#[derive(Debug)]
struct JsonDir {
    root_dir: PathBuf,
}

impl JsonDir {
    fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    async fn ensure_dir(&self, path: &PathBuf) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.write_bytes(key, &bytes).await
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

/// Local filesystem item store.
#[derive(Debug)]
pub struct LocalStore {
    dir: JsonDir,
    // Serializes read-modify-write cycles on the JSON files
    write_lock: tokio::sync::Mutex<()>,
}

impl LocalStore {
    /// Create a store rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: JsonDir::new(root_dir),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Archive key for the month an item ended.
    fn archive_key(when: DateTime<Utc>) -> String {
        format!("archive/{}/{:02}.json", when.year(), when.month())
    }

    async fn load_live(&self) -> Result<Vec<Item>> {
        Ok(self.dir.read_json("items.json").await?.unwrap_or_default())
    }

    async fn save_live(&self, items: &[Item]) -> Result<()> {
        self.dir.write_json("items.json", items).await
    }

    /// Load every archived item. Cold files are scanned in full; the local
    /// backend trades lookup speed for a dead-simple layout.
    async fn load_archived(&self) -> Result<Vec<Item>> {
        let mut items = Vec::new();
        let archive_root = self.dir.path("archive");

        let mut years = match tokio::fs::read_dir(&archive_root).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(items),
            Err(e) => return Err(AppError::Io(e)),
        };
        while let Some(year) = years.next_entry().await? {
            let mut months = tokio::fs::read_dir(year.path()).await?;
            while let Some(month) = months.next_entry().await? {
                if month.path().extension().and_then(|s| s.to_str()) != Some("json") {
                    continue;
                }
                let bytes = tokio::fs::read(month.path()).await?;
                let mut batch: Vec<Item> = serde_json::from_slice(&bytes)?;
                items.append(&mut batch);
            }
        }
        Ok(items)
    }
}

#[async_trait]
impl ItemStore for LocalStore {
    async fn find_by_native_url(&self, native_url: &str) -> Result<Option<Item>> {
        Ok(self
            .load_live()
            .await?
            .into_iter()
            .find(|item| item.native_url == native_url))
    }

    async fn get(&self, item_id: &str) -> Result<Option<Item>> {
        if let Some(item) = self
            .load_live()
            .await?
            .into_iter()
            .find(|item| item.item_id == item_id)
        {
            return Ok(Some(item));
        }
        Ok(self
            .load_archived()
            .await?
            .into_iter()
            .find(|item| item.item_id == item_id))
    }

    async fn exists(&self, item_id: &str) -> Result<bool> {
        Ok(self.get(item_id).await?.is_some())
    }

    async fn create(&self, item: &Item) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        if self.exists(&item.item_id).await? {
            return Err(AppError::conflict(format!(
                "item id {} already exists",
                item.item_id
            )));
        }
        let mut items = self.load_live().await?;
        if items.iter().any(|i| i.native_url == item.native_url) {
            return Err(AppError::conflict(format!(
                "native URL {} already has a live item",
                item.native_url
            )));
        }
        items.push(item.clone());
        self.save_live(&items).await?;
        log::info!("Stored item {} ({} live)", item.item_id, items.len());
        Ok(())
    }

    async fn update(&self, item: &Item) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut items = self.load_live().await?;
        let Some(slot) = items.iter_mut().find(|i| i.item_id == item.item_id) else {
            return Err(AppError::conflict(format!(
                "cannot update unknown item {}",
                item.item_id
            )));
        };
        *slot = item.clone();
        self.save_live(&items).await
    }

    async fn archive(&self, item: &Item) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut items = self.load_live().await?;
        items.retain(|i| i.item_id != item.item_id);
        self.save_live(&items).await?;

        let key = Self::archive_key(item.sale.date_ended.unwrap_or_else(Utc::now));
        let mut archived: Vec<Item> = self.dir.read_json(&key).await?.unwrap_or_default();
        archived.retain(|i| i.item_id != item.item_id);
        archived.push(item.clone());
        self.dir.write_json(&key, &archived).await?;
        log::info!("Archived item {} to {}", item.item_id, key);
        Ok(())
    }
}

/// Inverted index for full-text lookup over searchable strings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InvertedIndex {
    /// Version for cache busting
    pub version: u32,
    /// Number of indexed items
    pub item_count: usize,
    /// Number of unique tokens
    pub token_count: usize,
    /// keyword -> sorted item ids
    pub index: HashMap<String, Vec<String>>,
}

/// Persisted inverted index (`index.json`).
#[derive(Debug)]
pub struct LocalSearchIndex {
    dir: JsonDir,
    min_token_length: usize,
    write_lock: tokio::sync::Mutex<()>,
}

impl LocalSearchIndex {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: JsonDir::new(root_dir),
            min_token_length: 2,
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<InvertedIndex> {
        Ok(self.dir.read_json("index.json").await?.unwrap_or_default())
    }

    async fn save(&self, mut idx: InvertedIndex) -> Result<()> {
        idx.version = 1;
        idx.token_count = idx.index.len();
        let ids: HashSet<&String> = idx.index.values().flatten().collect();
        idx.item_count = ids.len();
        drop(ids);
        self.dir.write_json("index.json", &idx).await
    }

    /// Tokenize a string into normalized keywords.
    fn tokenize(&self, text: &str) -> Vec<String> {
        let normalized = text.to_lowercase();
        let mut seen = HashSet::new();
        normalized
            .unicode_words()
            .filter(|word| word.len() >= self.min_token_length)
            .filter(|word| !is_stopword(word))
            .filter(|word| seen.insert(word.to_string()))
            .map(String::from)
            .collect()
    }

    /// Ids of items matching every word of the query.
    pub async fn lookup(&self, query: &str) -> Result<Vec<String>> {
        let idx = self.load().await?;
        let tokens = self.tokenize(query);
        if tokens.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Option<HashSet<String>> = None;
        for token in tokens {
            let posting: HashSet<String> = idx
                .index
                .get(&token)
                .map(|ids| ids.iter().cloned().collect())
                .unwrap_or_default();
            hits = Some(match hits {
                None => posting,
                Some(prev) => prev.intersection(&posting).cloned().collect(),
            });
        }

        let mut ids: Vec<String> = hits.unwrap_or_default().into_iter().collect();
        ids.sort(); // Deterministic output
        Ok(ids)
    }
}

#[async_trait]
impl SearchIndex for LocalSearchIndex {
    async fn index(&self, item: &Item) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut idx = self.load().await?;
        // Drop stale postings before re-indexing
        for ids in idx.index.values_mut() {
            ids.retain(|id| id != &item.item_id);
        }
        for token in self.tokenize(&item.searchable_string) {
            let ids = idx.index.entry(token).or_default();
            ids.push(item.item_id.clone());
            ids.sort();
        }
        idx.index.retain(|_, ids| !ids.is_empty());
        self.save(idx).await
    }

    async fn remove(&self, item_id: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut idx = self.load().await?;
        for ids in idx.index.values_mut() {
            ids.retain(|id| id != item_id);
        }
        idx.index.retain(|_, ids| !ids.is_empty());
        self.save(idx).await
    }
}

/// Check if a word is a common stopword (English/Swedish).
fn is_stopword(word: &str) -> bool {
    const STOPWORDS: &[&str] = &[
        // English
        "the", "a", "an", "is", "are", "was", "were", "of", "to", "in", "for", "on", "with", "at",
        "by", "from", "as", "or", "and", "but", "if", // Swedish
        "och", "att", "det", "som", "en", "ett", "på", "för", "med", "till", "av", "är", "den",
        "om", "inte", "har", // Common URL artifacts
        "http", "https", "www", "com", "se", "html",
    ];
    STOPWORDS.contains(&word)
}

/// Append-only file queue of pending scrape tasks (`queue.json`).
#[derive(Debug)]
pub struct FileQueue {
    dir: JsonDir,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileQueue {
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: JsonDir::new(root_dir),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// The queued tasks, in enqueue order.
    pub async fn pending(&self) -> Result<Vec<ScrapeTask>> {
        Ok(self.dir.read_json("queue.json").await?.unwrap_or_default())
    }
}

#[async_trait]
impl ScrapeQueue for FileQueue {
    async fn enqueue(&self, task: ScrapeTask) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let mut tasks = self.pending().await?;
        tasks.push(task);
        self.dir.write_json("queue.json", &tasks).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Listing, ListingPayload, SaleListing};
    use tempfile::TempDir;

    fn item(item_id: &str, native_url: &str) -> Item {
        let listing = Listing {
            native_url: native_url.to_string(),
            is_complete: true,
            source: "test".to_string(),
            scraper_data: None,
            payload: ListingPayload::Sale(SaleListing {
                title: Some("gustavian chair".to_string()),
                price: Some(2000.0),
                currency: Some("SEK".to_string()),
                ..SaleListing::default()
            }),
        };
        Item::from_listing(&listing, item_id.to_string())
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store.create(&item("t-1", "https://x.se/1")).await.unwrap();
        let found = store.find_by_native_url("https://x.se/1").await.unwrap();
        assert_eq!(found.unwrap().item_id, "t-1");

        // Survives a fresh handle on the same directory
        let store2 = LocalStore::new(tmp.path());
        assert!(store2.exists("t-1").await.unwrap());
    }

    #[tokio::test]
    async fn test_create_conflict() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        store.create(&item("t-1", "https://x.se/1")).await.unwrap();
        let err = store
            .create(&item("t-2", "https://x.se/1"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_archive_partitions_by_month() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        let mut i = item("t-1", "https://x.se/1");
        store.create(&i).await.unwrap();
        i.mark_as_ended(&SaleListing::default());
        store.archive(&i).await.unwrap();

        let ended = i.sale.date_ended.unwrap();
        let key = format!("archive/{}/{:02}.json", ended.year(), ended.month());
        assert!(tmp.path().join(key).exists());

        // Gone from live, still found by id
        assert!(
            store
                .find_by_native_url("https://x.se/1")
                .await
                .unwrap()
                .is_none()
        );
        let archived = store.get("t-1").await.unwrap().unwrap();
        assert!(archived.sale.has_ended);
    }

    #[tokio::test]
    async fn test_update_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = LocalStore::new(tmp.path());

        let mut i = item("t-1", "https://x.se/1");
        store.create(&i).await.unwrap();
        i.sale.price = Some(1500.0);
        store.update(&i).await.unwrap();

        let loaded = store.get("t-1").await.unwrap().unwrap();
        assert_eq!(loaded.sale.price, Some(1500.0));
    }

    #[tokio::test]
    async fn test_inverted_index() {
        let tmp = TempDir::new().unwrap();
        let index = LocalSearchIndex::new(tmp.path());

        let mut a = item("t-1", "https://x.se/1");
        a.searchable_string = "gustavian chair stockholm".to_string();
        let mut b = item("t-2", "https://x.se/2");
        b.searchable_string = "gustavian table uppsala".to_string();

        index.index(&a).await.unwrap();
        index.index(&b).await.unwrap();

        assert_eq!(index.lookup("gustavian").await.unwrap(), vec!["t-1", "t-2"]);
        assert_eq!(index.lookup("gustavian chair").await.unwrap(), vec!["t-1"]);
        assert!(index.lookup("rococo").await.unwrap().is_empty());

        index.remove("t-1").await.unwrap();
        assert_eq!(index.lookup("gustavian").await.unwrap(), vec!["t-2"]);

        // Stopwords and short tokens never hit
        assert!(index.lookup("och").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reindex_replaces_postings() {
        let tmp = TempDir::new().unwrap();
        let index = LocalSearchIndex::new(tmp.path());

        let mut a = item("t-1", "https://x.se/1");
        a.searchable_string = "gustavian chair".to_string();
        index.index(&a).await.unwrap();

        a.searchable_string = "rococo chair".to_string();
        index.index(&a).await.unwrap();

        assert!(index.lookup("gustavian").await.unwrap().is_empty());
        assert_eq!(index.lookup("rococo").await.unwrap(), vec!["t-1"]);
    }

    #[tokio::test]
    async fn test_file_queue() {
        let tmp = TempDir::new().unwrap();
        let queue = FileQueue::new(tmp.path());

        queue
            .enqueue(ScrapeTask {
                source: "test".to_string(),
                native_url: "https://x.se/1".to_string(),
                scraper_data: Some("state".to_string()),
            })
            .await
            .unwrap();

        let tasks = queue.pending().await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].native_url, "https://x.se/1");
    }
}
