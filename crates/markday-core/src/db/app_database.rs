//! Shared handle to the application database.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use super::{Database, LibSqlDiaryStore, LibSqlFileMetadataStore, LibSqlSettingsStore};
use crate::Result;

/// Thread-safe handle that hands out the libSQL-backed stores.
///
/// All stores created from one handle share a single connection. Create each
/// store once per process: every store publishes its own snapshots, so writes
/// made through one instance are not observed by another.
#[derive(Clone)]
pub struct AppDatabase {
    db: Arc<Mutex<Database>>,
}

impl AppDatabase {
    /// Open (or create) the database file at `db_path`.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db = Database::open(db_path.into()).await?;
        Ok(Self::from_database(db))
    }

    /// Open an in-memory database (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self::from_database(db))
    }

    fn from_database(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, Database> {
        self.db.lock().await
    }

    /// Diary entry store backed by this database.
    pub async fn diary_store(&self) -> Result<LibSqlDiaryStore> {
        LibSqlDiaryStore::new(self.clone()).await
    }

    /// File metadata store backed by this database.
    pub async fn file_metadata_store(&self) -> Result<LibSqlFileMetadataStore> {
        LibSqlFileMetadataStore::new(self.clone()).await
    }

    /// Settings store backed by this database.
    pub async fn settings_store(&self) -> Result<LibSqlSettingsStore> {
        LibSqlSettingsStore::new(self.clone()).await
    }
}
