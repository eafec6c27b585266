use std::path::{Path, PathBuf};
use std::sync::Arc;

use markday_core::db::{
    AppDatabase, LibSqlDiaryStore, LibSqlFileMetadataStore, LibSqlSettingsStore,
};
use markday_core::files::{FileManager, InMemoryFileManager, LocalFileManager};
use markday_core::settings::{InMemorySettingsStore, SettingsStore};
use markday_core::store::{InMemoryDiaryStore, InMemoryFileMetadataStore};
use markday_core::{DiaryRepository, DiaryStore, FileMetadataStore, FileRepository};

use crate::error::CliError;

pub const DB_FILE_NAME: &str = "markday.db";
pub const FILES_DIR_NAME: &str = "files";

/// Where the command's data lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageLocation {
    InMemory,
    Directory { db_path: PathBuf, files_dir: PathBuf },
}

/// Repositories and settings for one CLI invocation
pub struct Storage<D, M, F, S>
where
    D: DiaryStore,
    M: FileMetadataStore,
    F: FileManager,
    S: SettingsStore,
{
    pub diary: DiaryRepository<D>,
    pub moments: FileRepository<F, M>,
    pub settings: Arc<S>,
    pub location: StorageLocation,
}

pub type DiskStorage =
    Storage<LibSqlDiaryStore, LibSqlFileMetadataStore, LocalFileManager, LibSqlSettingsStore>;

pub type MemoryStorage = Storage<
    InMemoryDiaryStore,
    InMemoryFileMetadataStore,
    InMemoryFileManager,
    InMemorySettingsStore,
>;

pub async fn open_data_dir(data_dir: &Path) -> Result<DiskStorage, CliError> {
    let db_path = data_dir.join(DB_FILE_NAME);
    let files_dir = data_dir.join(FILES_DIR_NAME);

    let db = AppDatabase::open_path(&db_path).await?;
    let files = LocalFileManager::new(&files_dir).await?;

    Ok(Storage {
        diary: DiaryRepository::new(db.diary_store().await?),
        moments: FileRepository::new(files, db.file_metadata_store().await?),
        settings: Arc::new(db.settings_store().await?),
        location: StorageLocation::Directory { db_path, files_dir },
    })
}

pub fn in_memory() -> MemoryStorage {
    Storage {
        diary: DiaryRepository::new(InMemoryDiaryStore::new()),
        moments: FileRepository::new(InMemoryFileManager::new(), InMemoryFileMetadataStore::new()),
        settings: Arc::new(InMemorySettingsStore::new()),
        location: StorageLocation::InMemory,
    }
}
