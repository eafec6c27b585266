//! Storage port contracts for persisted collections.
//!
//! A store owns the durable copy of one entity collection and publishes the
//! whole collection as a fresh snapshot after every successful mutation.
//! Repositories consume stores through these traits, so the concrete backend
//! (libSQL on disk or the in-memory realization) is picked by whoever
//! constructs the repository.
//!
//! Id policy differs per entity and both realizations honour it:
//!
//! | Entity          | `id == 0`          | explicit id             |
//! |-----------------|--------------------|-------------------------|
//! | `DiaryEntry`    | fresh positive id  | strict insert           |
//! | `FileMetadata`  | fresh positive id  | upsert (replace by id)  |

mod memory;

use std::future::Future;

use tokio::sync::watch;

use crate::error::Result;
use crate::models::{DiaryEntry, FileMetadata};

pub use memory::{InMemoryDiaryStore, InMemoryFileMetadataStore};

/// Level-triggered stream of full collection snapshots.
///
/// The first call to [`Snapshots::next`] yields the current value right away;
/// later calls wait for the next published snapshot. Intermediate snapshots
/// may be skipped, the latest one is never lost.
#[derive(Debug, Clone)]
pub struct Snapshots<T> {
    rx: watch::Receiver<Vec<T>>,
    primed: bool,
}

impl<T: Clone> Snapshots<T> {
    pub(crate) const fn new(rx: watch::Receiver<Vec<T>>) -> Self {
        Self { rx, primed: false }
    }

    /// Wait for the next snapshot.
    ///
    /// Returns `None` once the publisher has been dropped.
    pub async fn next(&mut self) -> Option<Vec<T>> {
        if self.primed {
            self.rx.changed().await.ok()?;
        } else {
            self.primed = true;
        }
        Some(self.rx.borrow_and_update().clone())
    }

    /// The most recently published snapshot, without waiting.
    pub fn current(&self) -> Vec<T> {
        self.rx.borrow().clone()
    }

    /// Wait until a snapshot satisfies `predicate` and return it.
    ///
    /// Returns `None` if the publisher goes away first.
    pub async fn wait_for(&mut self, mut predicate: impl FnMut(&[T]) -> bool) -> Option<Vec<T>> {
        self.primed = true;
        let snapshot = self.rx.wait_for(|items| predicate(items)).await.ok()?;
        Some(snapshot.clone())
    }
}

/// Durable storage for diary entries.
pub trait DiaryStore: Send + Sync + 'static {
    /// One-shot read of every stored entry.
    fn get_all(&self) -> impl Future<Output = Result<Vec<DiaryEntry>>> + Send;

    /// Live view of the stored entries.
    fn observe_all(&self) -> Snapshots<DiaryEntry>;

    /// Persist a new entry and return its id.
    ///
    /// Fails with `Error::AlreadyExists` when an explicit id is taken.
    fn insert(&self, entry: &DiaryEntry) -> impl Future<Output = Result<i64>> + Send;

    /// Replace the entry with the same id.
    ///
    /// Fails with `Error::NotFound` when no entry has that id.
    fn update(&self, entry: &DiaryEntry) -> impl Future<Output = Result<()>> + Send;

    /// Remove the entry with the same id. Missing ids are not an error.
    fn delete(&self, entry: &DiaryEntry) -> impl Future<Output = Result<()>> + Send;
}

/// Durable storage for moment file metadata.
pub trait FileMetadataStore: Send + Sync + 'static {
    /// One-shot read of every stored record.
    fn get_all(&self) -> impl Future<Output = Result<Vec<FileMetadata>>> + Send;

    /// Live view of the stored records.
    fn observe_all(&self) -> Snapshots<FileMetadata>;

    /// Look up a record by id.
    fn get_by_id(&self, id: i64) -> impl Future<Output = Result<Option<FileMetadata>>> + Send;

    /// Look up a record by its file path key.
    fn get_by_path(&self, path: &str)
        -> impl Future<Output = Result<Option<FileMetadata>>> + Send;

    /// Insert or replace a record and return its id.
    fn insert(&self, metadata: &FileMetadata) -> impl Future<Output = Result<i64>> + Send;

    /// Replace the record with the same id.
    ///
    /// Fails with `Error::NotFound` when no record has that id.
    fn update(&self, metadata: &FileMetadata) -> impl Future<Output = Result<()>> + Send;

    /// Remove the record with the same id. Missing ids are not an error.
    fn delete(&self, metadata: &FileMetadata) -> impl Future<Output = Result<()>> + Send;
}
