//! Moment file repository

use std::sync::Arc;

use super::cache::{spawn_sync, SnapshotCache, SyncTasks};
use crate::error::Result;
use crate::files::FileManager;
use crate::models::FileMetadata;
use crate::store::{FileMetadataStore, Snapshots};
use crate::util::unix_millis_now;

/// Moment files: raw bytes in a [`FileManager`], metadata in a
/// [`FileMetadataStore`], with a cached view of the metadata.
pub struct FileRepository<F: FileManager, M: FileMetadataStore> {
    files: F,
    metadata: Arc<M>,
    cache: Arc<SnapshotCache<FileMetadata>>,
    _sync: SyncTasks,
}

impl<F: FileManager, M: FileMetadataStore> FileRepository<F, M> {
    /// Wrap the two stores and start keeping the metadata cache in sync.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(files: F, metadata: M) -> Self {
        let metadata = Arc::new(metadata);
        let cache = Arc::new(SnapshotCache::new());

        let seed_store = Arc::clone(&metadata);
        let sync = spawn_sync(
            &cache,
            metadata.observe_all(),
            async move { seed_store.get_all().await },
            "file metadata",
        );

        Self {
            files,
            metadata,
            cache,
            _sync: sync,
        }
    }

    /// Cached metadata as of now
    pub fn files(&self) -> Vec<FileMetadata> {
        self.cache.current()
    }

    /// Observe the cached metadata
    pub fn subscribe(&self) -> Snapshots<FileMetadata> {
        self.cache.subscribe()
    }

    /// Wait until the cache has been filled for the first time
    pub async fn ready(&self) {
        self.cache.ready().await;
    }

    /// Store `content` under `file_name` and record its metadata.
    ///
    /// Saving over an existing path replaces the bytes and the tags but keeps
    /// the record's id, name and creation time.
    pub async fn save_file(
        &self,
        file_name: &str,
        content: &[u8],
        tags: Vec<String>,
    ) -> Result<FileMetadata> {
        self.files.save(file_name, content).await?;

        if let Some(mut existing) = self.metadata.get_by_path(file_name).await? {
            existing.tags = tags;
            self.metadata.update(&existing).await?;
            tracing::debug!(id = existing.id, "Replaced moment {file_name}");
            return Ok(existing);
        }

        let mut record = FileMetadata::new(file_name, file_name, tags, unix_millis_now());
        record.id = self.metadata.insert(&record).await?;
        tracing::debug!(id = record.id, "Saved moment {file_name}");
        Ok(record)
    }

    /// Remove the bytes, then the metadata record
    pub async fn delete_file(&self, metadata: &FileMetadata) -> Result<()> {
        self.files.delete(&metadata.file_path).await?;
        self.metadata.delete(metadata).await
    }

    /// Stored bytes for `metadata`, `None` if the file is gone
    pub async fn get_file_content(&self, metadata: &FileMetadata) -> Result<Option<Vec<u8>>> {
        self.files.read(&metadata.file_path).await
    }

    /// Metadata record by id
    pub async fn get_file_by_id(&self, id: i64) -> Result<Option<FileMetadata>> {
        self.metadata.get_by_id(id).await
    }

    /// Metadata record by file path
    pub async fn get_file_by_path(&self, path: &str) -> Result<Option<FileMetadata>> {
        self.metadata.get_by_path(path).await
    }

    /// Underlying byte storage
    pub const fn file_manager(&self) -> &F {
        &self.files
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use tokio::time::timeout;

    use super::*;
    use crate::db::AppDatabase;
    use crate::files::{InMemoryFileManager, LocalFileManager};
    use crate::store::InMemoryFileMetadataStore;

    const WAIT: Duration = Duration::from_secs(5);

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    fn in_memory() -> FileRepository<InMemoryFileManager, InMemoryFileMetadataStore> {
        FileRepository::new(InMemoryFileManager::new(), InMemoryFileMetadataStore::new())
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_save_read_delete_scenario() {
        let repo = in_memory();

        let saved = repo.save_file("a.txt", b"hi", tags(&["t"])).await.unwrap();
        assert!(saved.is_persisted());
        assert_eq!(saved.file_path, "a.txt");
        assert_eq!(saved.original_file_name, "a.txt");

        let found = repo.get_file_by_path("a.txt").await.unwrap().unwrap();
        assert_eq!(found.tags, tags(&["t"]));
        assert_eq!(
            repo.get_file_content(&found).await.unwrap(),
            Some(b"hi".to_vec())
        );

        repo.delete_file(&found).await.unwrap();
        assert_eq!(repo.get_file_content(&found).await.unwrap(), None);
        assert!(repo.get_file_by_path("a.txt").await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_resave_replaces_tags_and_keeps_identity() {
        let repo = in_memory();

        let first = repo
            .save_file("beach.jpg", b"v1", tags(&["trip"]))
            .await
            .unwrap();
        let second = repo
            .save_file("beach.jpg", b"v2", tags(&["sea", "sun"]))
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.tags, tags(&["sea", "sun"]));

        let mut snapshots = repo.subscribe();
        let cached = timeout(
            WAIT,
            snapshots.wait_for(|files| files.len() == 1 && files[0].tags.len() == 2),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(cached[0].id, first.id);
        assert_eq!(
            repo.get_file_content(&second).await.unwrap(),
            Some(b"v2".to_vec())
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_lookups_return_none_when_absent() {
        let repo = in_memory();
        repo.ready().await;

        assert!(repo.get_file_by_id(3).await.unwrap().is_none());
        assert!(repo.get_file_by_path("nope").await.unwrap().is_none());
        assert!(repo.files().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_on_disk_backends() {
        let tmp = tempfile::tempdir().unwrap();
        let db = AppDatabase::open_path(tmp.path().join("markday.db"))
            .await
            .unwrap();
        let files = LocalFileManager::new(tmp.path().join("files")).await.unwrap();
        let repo = FileRepository::new(files, db.file_metadata_store().await.unwrap());

        let saved = repo
            .save_file("photo.png", &[0x89, 0x50], tags(&["home"]))
            .await
            .unwrap();

        let by_id = repo.get_file_by_id(saved.id).await.unwrap().unwrap();
        assert_eq!(by_id, saved);
        assert!(tmp.path().join("files").join("photo.png").exists());

        let mut snapshots = repo.subscribe();
        timeout(WAIT, snapshots.wait_for(|files| files.len() == 1))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(repo.files(), vec![saved.clone()]);

        let resaved = repo
            .save_file("photo.png", &[0x89, 0x50, 0x4e], tags(&["home", "cat"]))
            .await
            .unwrap();
        assert_eq!(resaved.id, saved.id);
        assert_eq!(resaved.created_at, saved.created_at);

        let cached = timeout(
            WAIT,
            snapshots.wait_for(|files| files.len() == 1 && files[0].tags.len() == 2),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(cached, vec![resaved.clone()]);
        assert_eq!(
            repo.get_file_content(&resaved).await.unwrap(),
            Some(vec![0x89, 0x50, 0x4e])
        );

        repo.delete_file(&saved).await.unwrap();
        assert!(!repo.file_manager().exists("photo.png").await.unwrap());
    }
}
