//! Snapshot cache shared by the repositories

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::store::Snapshots;

/// Which source last filled the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    Empty,
    Seed,
    Live,
}

/// Latest known collection, written only by the repository's sync tasks.
///
/// `origin` is only touched inside an `items` modification closure, so both
/// channels change together under the `items` write lock.
#[derive(Debug)]
pub struct SnapshotCache<T> {
    items: watch::Sender<Vec<T>>,
    origin: watch::Sender<Origin>,
}

impl<T: Clone + Send + Sync + 'static> SnapshotCache<T> {
    pub fn new() -> Self {
        Self {
            items: watch::Sender::new(Vec::new()),
            origin: watch::Sender::new(Origin::Empty),
        }
    }

    pub fn current(&self) -> Vec<T> {
        self.items.borrow().clone()
    }

    pub fn find(&self, predicate: impl Fn(&T) -> bool) -> Option<T> {
        self.items.borrow().iter().find(|item| predicate(item)).cloned()
    }

    pub fn subscribe(&self) -> Snapshots<T> {
        Snapshots::new(self.items.subscribe())
    }

    /// Resolve once either source has filled the cache
    pub async fn ready(&self) {
        let mut origin = self.origin.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = origin.wait_for(|origin| *origin != Origin::Empty).await;
    }

    /// Replace the cache with a store emission
    pub fn apply_live(&self, snapshot: Vec<T>) {
        self.items.send_modify(|items| {
            *items = snapshot;
            self.origin.send_replace(Origin::Live);
        });
    }

    /// Fill the cache from the one-shot seed.
    ///
    /// Empty seeds and seeds arriving after a live emission are dropped.
    /// Returns whether the seed was applied.
    pub fn apply_seed(&self, snapshot: Vec<T>) -> bool {
        if snapshot.is_empty() {
            return false;
        }
        let mut snapshot = Some(snapshot);
        self.items.send_if_modified(|items| {
            if *self.origin.borrow() == Origin::Live {
                return false;
            }
            if let Some(seed) = snapshot.take() {
                *items = seed;
            }
            self.origin.send_replace(Origin::Seed);
            true
        })
    }
}

/// Background tasks feeding a cache, aborted when dropped
#[derive(Debug)]
pub struct SyncTasks(Vec<JoinHandle<()>>);

impl Drop for SyncTasks {
    fn drop(&mut self) {
        for task in &self.0 {
            task.abort();
        }
    }
}

/// Start the live subscription and the one-shot seed for `cache`.
///
/// Must be called from within a tokio runtime.
pub fn spawn_sync<T, F>(
    cache: &Arc<SnapshotCache<T>>,
    mut live: Snapshots<T>,
    seed: F,
    label: &'static str,
) -> SyncTasks
where
    T: Clone + Send + Sync + 'static,
    F: Future<Output = Result<Vec<T>>> + Send + 'static,
{
    let live_cache = Arc::clone(cache);
    let live_task = tokio::spawn(async move {
        while let Some(snapshot) = live.next().await {
            live_cache.apply_live(snapshot);
        }
        tracing::warn!("{label} subscription ended; keeping the last snapshot");
    });

    let seed_cache = Arc::clone(cache);
    let seed_task = tokio::spawn(async move {
        match seed.await {
            Ok(snapshot) => {
                if !seed_cache.apply_seed(snapshot) {
                    tracing::debug!("{label} seed skipped");
                }
            }
            Err(error) => tracing::warn!("Failed to load initial {label}: {error}"),
        }
    });

    SyncTasks(vec![live_task, seed_task])
}
