//! Diary entry repository

use std::sync::Arc;

use super::cache::{spawn_sync, SnapshotCache, SyncTasks};
use crate::error::Result;
use crate::models::DiaryEntry;
use crate::store::{DiaryStore, Snapshots};

/// Cached, observable view over a [`DiaryStore`].
///
/// The cache only ever changes when the store publishes; writes go straight
/// to the store and show up here once the store's next snapshot arrives.
pub struct DiaryRepository<S: DiaryStore> {
    store: Arc<S>,
    cache: Arc<SnapshotCache<DiaryEntry>>,
    _sync: SyncTasks,
}

impl<S: DiaryStore> DiaryRepository<S> {
    /// Wrap `store` and start keeping the cache in sync.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(store: S) -> Self {
        let store = Arc::new(store);
        let cache = Arc::new(SnapshotCache::new());

        let seed_store = Arc::clone(&store);
        let sync = spawn_sync(
            &cache,
            store.observe_all(),
            async move { seed_store.get_all().await },
            "diary entries",
        );

        Self {
            store,
            cache,
            _sync: sync,
        }
    }

    /// Cached entries as of now
    pub fn entries(&self) -> Vec<DiaryEntry> {
        self.cache.current()
    }

    /// Observe the cached entries
    pub fn subscribe(&self) -> Snapshots<DiaryEntry> {
        self.cache.subscribe()
    }

    /// Cached entry with the given id
    pub fn get(&self, id: i64) -> Option<DiaryEntry> {
        self.cache.find(|entry| entry.id == id)
    }

    /// Wait until the cache has been filled for the first time
    pub async fn ready(&self) {
        self.cache.ready().await;
    }

    /// Persist a new entry and return its id
    pub async fn insert(&self, entry: &DiaryEntry) -> Result<i64> {
        self.store.insert(entry).await
    }

    /// Replace a stored entry
    pub async fn update(&self, entry: &DiaryEntry) -> Result<()> {
        self.store.update(entry).await
    }

    /// Delete a stored entry
    pub async fn delete(&self, entry: &DiaryEntry) -> Result<()> {
        self.store.delete(entry).await
    }

    /// Delete several entries in order, stopping at the first failure
    pub async fn delete_all(&self, entries: &[DiaryEntry]) -> Result<()> {
        for entry in entries {
            self.store.delete(entry).await?;
        }
        Ok(())
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }
}
