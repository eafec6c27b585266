//! In-memory store realizations.
//!
//! The collection lives inside a `watch` channel, so every mutation is applied
//! under the channel's write lock and published to observers in one step.

use std::sync::atomic::{AtomicI64, Ordering};

use tokio::sync::watch;

use super::{DiaryStore, FileMetadataStore, Snapshots};
use crate::error::{Error, Result};
use crate::models::{DiaryEntry, FileMetadata, UNSAVED_ID};

/// Marks an allocator that has handed out `i64::MAX`
const EXHAUSTED: i64 = 0;

/// Monotonic id source; an id is never handed out twice.
///
/// Only used inside a collection's modification closure, so load/store pairs
/// are serialized by the channel's write lock.
#[derive(Debug)]
struct IdAllocator {
    next: AtomicI64,
}

impl IdAllocator {
    fn starting_after(max_id: i64) -> Self {
        Self {
            next: AtomicI64::new(successor(max_id.max(0))),
        }
    }

    /// Next fresh id, or an error once `i64::MAX` has been used
    fn allocate(&self) -> Result<i64> {
        let id = self.next.load(Ordering::SeqCst);
        if id == EXHAUSTED {
            return Err(Error::Database("id space exhausted".to_string()));
        }
        self.next.store(successor(id), Ordering::SeqCst);
        Ok(id)
    }

    /// Keep allocation ahead of an explicitly chosen id
    fn reserve(&self, id: i64) {
        let next = self.next.load(Ordering::SeqCst);
        if next != EXHAUSTED && id >= next {
            self.next.store(successor(id), Ordering::SeqCst);
        }
    }
}

fn successor(id: i64) -> i64 {
    id.checked_add(1).unwrap_or(EXHAUSTED)
}

fn reject_negative_id(id: i64) -> Result<()> {
    if id < 0 {
        return Err(Error::InvalidInput(format!("id must not be negative: {id}")));
    }
    Ok(())
}

/// Diary entries kept in process memory
#[derive(Debug)]
pub struct InMemoryDiaryStore {
    state: watch::Sender<Vec<DiaryEntry>>,
    ids: IdAllocator,
}

impl InMemoryDiaryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::with_entries(Vec::new())
    }

    /// Create a store pre-populated with `entries` (ids taken verbatim)
    pub fn with_entries(entries: Vec<DiaryEntry>) -> Self {
        let max_id = entries.iter().map(|entry| entry.id).max().unwrap_or(0);
        let ids = IdAllocator::starting_after(max_id);
        let (state, _) = watch::channel(entries);
        Self { state, ids }
    }
}

impl Default for InMemoryDiaryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DiaryStore for InMemoryDiaryStore {
    async fn get_all(&self) -> Result<Vec<DiaryEntry>> {
        Ok(self.state.borrow().clone())
    }

    fn observe_all(&self) -> Snapshots<DiaryEntry> {
        Snapshots::new(self.state.subscribe())
    }

    async fn insert(&self, entry: &DiaryEntry) -> Result<i64> {
        reject_negative_id(entry.id)?;

        let mut outcome = Ok(UNSAVED_ID);
        self.state.send_if_modified(|entries| {
            let id = if entry.id == UNSAVED_ID {
                match self.ids.allocate() {
                    Ok(id) => id,
                    Err(error) => {
                        outcome = Err(error);
                        return false;
                    }
                }
            } else if entries.iter().any(|existing| existing.id == entry.id) {
                outcome = Err(Error::AlreadyExists(format!("diary entry {}", entry.id)));
                return false;
            } else {
                self.ids.reserve(entry.id);
                entry.id
            };
            entries.push(entry.clone().with_id(id));
            outcome = Ok(id);
            true
        });

        if let Ok(id) = outcome {
            tracing::debug!(id, "Inserted diary entry in memory");
        }
        outcome
    }

    async fn update(&self, entry: &DiaryEntry) -> Result<()> {
        let updated = self.state.send_if_modified(|entries| {
            entries
                .iter_mut()
                .find(|existing| existing.id == entry.id)
                .map(|existing| *existing = entry.clone())
                .is_some()
        });

        if updated {
            Ok(())
        } else {
            Err(Error::NotFound(format!("diary entry {}", entry.id)))
        }
    }

    async fn delete(&self, entry: &DiaryEntry) -> Result<()> {
        self.state.send_if_modified(|entries| {
            let before = entries.len();
            entries.retain(|existing| existing.id != entry.id);
            entries.len() != before
        });
        Ok(())
    }
}

/// Moment file metadata kept in process memory
#[derive(Debug)]
pub struct InMemoryFileMetadataStore {
    state: watch::Sender<Vec<FileMetadata>>,
    ids: IdAllocator,
}

impl InMemoryFileMetadataStore {
    /// Create an empty store
    pub fn new() -> Self {
        let (state, _) = watch::channel(Vec::new());
        Self {
            state,
            ids: IdAllocator::starting_after(0),
        }
    }
}

impl Default for InMemoryFileMetadataStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FileMetadataStore for InMemoryFileMetadataStore {
    async fn get_all(&self) -> Result<Vec<FileMetadata>> {
        Ok(self.state.borrow().clone())
    }

    fn observe_all(&self) -> Snapshots<FileMetadata> {
        Snapshots::new(self.state.subscribe())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<FileMetadata>> {
        Ok(self.state.borrow().iter().find(|meta| meta.id == id).cloned())
    }

    async fn get_by_path(&self, path: &str) -> Result<Option<FileMetadata>> {
        Ok(self
            .state
            .borrow()
            .iter()
            .find(|meta| meta.file_path == path)
            .cloned())
    }

    async fn insert(&self, metadata: &FileMetadata) -> Result<i64> {
        reject_negative_id(metadata.id)?;

        let mut outcome = Ok(UNSAVED_ID);
        self.state.send_if_modified(|files| {
            let assigned = if metadata.id == UNSAVED_ID {
                match self.ids.allocate() {
                    Ok(id) => id,
                    Err(error) => {
                        outcome = Err(error);
                        return false;
                    }
                }
            } else {
                self.ids.reserve(metadata.id);
                metadata.id
            };
            let record = FileMetadata {
                id: assigned,
                ..metadata.clone()
            };
            match files.iter_mut().find(|existing| existing.id == assigned) {
                Some(existing) => *existing = record,
                None => files.push(record),
            }
            outcome = Ok(assigned);
            true
        });

        if let Ok(id) = outcome {
            tracing::debug!(id, path = %metadata.file_path, "Upserted file metadata in memory");
        }
        outcome
    }

    async fn update(&self, metadata: &FileMetadata) -> Result<()> {
        let updated = self.state.send_if_modified(|files| {
            files
                .iter_mut()
                .find(|existing| existing.id == metadata.id)
                .map(|existing| *existing = metadata.clone())
                .is_some()
        });

        if updated {
            Ok(())
        } else {
            Err(Error::NotFound(format!("file metadata {}", metadata.id)))
        }
    }

    async fn delete(&self, metadata: &FileMetadata) -> Result<()> {
        self.state.send_if_modified(|files| {
            let before = files.len();
            files.retain(|existing| existing.id != metadata.id);
            files.len() != before
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn entry(title: &str) -> DiaryEntry {
        DiaryEntry::new(title, "x", NaiveDate::from_ymd_opt(2025, 5, 1).unwrap())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_insert_assigns_sequential_ids() {
        let store = InMemoryDiaryStore::new();

        assert_eq!(store.insert(&entry("A")).await.unwrap(), 1);
        assert_eq!(store.insert(&entry("B")).await.unwrap(), 2);

        let mut ids: Vec<i64> = store.get_all().await.unwrap().iter().map(|e| e.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_ids_are_not_reused_after_delete() {
        let store = InMemoryDiaryStore::new();
        let first = store.insert(&entry("A")).await.unwrap();
        let second = store.insert(&entry("B")).await.unwrap();
        store.delete(&entry("B").with_id(second)).await.unwrap();

        let third = store.insert(&entry("C")).await.unwrap();
        assert!(third > second);
        assert_ne!(third, first);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_explicit_id_is_strict_for_diary_entries() {
        let store = InMemoryDiaryStore::new();
        assert_eq!(store.insert(&entry("A").with_id(7)).await.unwrap(), 7);

        let err = store.insert(&entry("B").with_id(7)).await.unwrap_err();
        assert!(matches!(err, Error::AlreadyExists(_)));

        // Allocation continues past explicit ids
        assert_eq!(store.insert(&entry("C")).await.unwrap(), 8);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_negative_id_is_rejected() {
        let store = InMemoryDiaryStore::new();
        let err = store.insert(&entry("A").with_id(-3)).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_update_missing_id_is_not_found() {
        let store = InMemoryDiaryStore::new();
        let err = store.update(&entry("ghost").with_id(99)).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(store.get_all().await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete_is_idempotent() {
        let store = InMemoryDiaryStore::new();
        let id = store.insert(&entry("A")).await.unwrap();
        store.insert(&entry("B")).await.unwrap();
        let doomed = entry("A").with_id(id);

        store.delete(&doomed).await.unwrap();
        let after_first = store.get_all().await.unwrap();
        store.delete(&doomed).await.unwrap();

        assert_eq!(store.get_all().await.unwrap(), after_first);
        assert_eq!(after_first.len(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_observe_emits_current_then_changes() {
        let store = InMemoryDiaryStore::with_entries(vec![entry("seeded").with_id(3)]);
        let mut snapshots = store.observe_all();

        let first = snapshots.next().await.unwrap();
        assert_eq!(first.len(), 1);

        let id = store.insert(&entry("new")).await.unwrap();
        assert_eq!(id, 4);
        let second = snapshots.next().await.unwrap();
        assert_eq!(second.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_file_metadata_explicit_id_upserts() {
        let store = InMemoryFileMetadataStore::new();
        let meta = FileMetadata::new("a.jpg", "a.jpg", vec!["trip".to_string()], 10);

        let id = store.insert(&meta).await.unwrap();
        assert_eq!(id, 1);

        let replaced = FileMetadata {
            id,
            tags: vec!["beach".to_string()],
            ..meta.clone()
        };
        assert_eq!(store.insert(&replaced).await.unwrap(), id);

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].tags, vec!["beach".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_file_metadata_lookups() {
        let store = InMemoryFileMetadataStore::new();
        let id = store
            .insert(&FileMetadata::new("a.jpg", "moments/a.jpg", Vec::new(), 1))
            .await
            .unwrap();

        assert_eq!(
            store.get_by_path("moments/a.jpg").await.unwrap().map(|m| m.id),
            Some(id)
        );
        assert!(store.get_by_path("missing.jpg").await.unwrap().is_none());
        assert!(store.get_by_id(id).await.unwrap().is_some());
        assert!(store.get_by_id(id + 1).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_file_metadata_update_missing_is_not_found() {
        let store = InMemoryFileMetadataStore::new();
        let ghost = FileMetadata {
            id: 5,
            ..FileMetadata::new("a.jpg", "a.jpg", Vec::new(), 1)
        };
        assert!(matches!(
            store.update(&ghost).await.unwrap_err(),
            Error::NotFound(_)
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_largest_explicit_id_exhausts_allocation() {
        let store = InMemoryDiaryStore::new();
        assert_eq!(store.insert(&entry("last").with_id(i64::MAX)).await.unwrap(), i64::MAX);

        let err = store.insert(&entry("after")).await.unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert_eq!(store.get_all().await.unwrap().len(), 1);

        // Explicit ids below the maximum are still accepted
        assert_eq!(store.insert(&entry("low").with_id(3)).await.unwrap(), 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_seeded_maximum_id_exhausts_allocation() {
        let store = InMemoryDiaryStore::with_entries(vec![entry("last").with_id(i64::MAX)]);
        assert!(matches!(
            store.insert(&entry("after")).await.unwrap_err(),
            Error::Database(_)
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_file_metadata_largest_explicit_id() {
        let store = InMemoryFileMetadataStore::new();
        let last = FileMetadata {
            id: i64::MAX,
            ..FileMetadata::new("z.jpg", "z.jpg", Vec::new(), 1)
        };
        assert_eq!(store.insert(&last).await.unwrap(), i64::MAX);
        // Upserting the same id again is still allowed
        assert_eq!(store.insert(&last).await.unwrap(), i64::MAX);

        let fresh = FileMetadata::new("a.jpg", "a.jpg", Vec::new(), 2);
        assert!(matches!(
            store.insert(&fresh).await.unwrap_err(),
            Error::Database(_)
        ));
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }
}
