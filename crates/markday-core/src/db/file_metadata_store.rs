//! libSQL-backed moment file metadata store

use libsql::{params, Connection, Row};
use tokio::sync::watch;

use super::AppDatabase;
use crate::error::{Error, Result};
use crate::models::{FileMetadata, UNSAVED_ID};
use crate::store::{FileMetadataStore, Snapshots};

const COLUMNS: &str = "id, original_file_name, file_path, tags, created_at";

/// File metadata persisted in the `file_metadata` table. Tags are stored as a
/// JSON array.
pub struct LibSqlFileMetadataStore {
    db: AppDatabase,
    changes: watch::Sender<Vec<FileMetadata>>,
}

impl LibSqlFileMetadataStore {
    /// Create a store and load the current table contents
    pub async fn new(db: AppDatabase) -> Result<Self> {
        let initial = {
            let guard = db.lock().await;
            query_all(guard.connection()).await?
        };
        let (changes, _) = watch::channel(initial);
        Ok(Self { db, changes })
    }

    async fn publish(&self, conn: &Connection) {
        match query_all(conn).await {
            Ok(records) => {
                self.changes.send_replace(records);
            }
            Err(error) => {
                tracing::warn!("Failed to refresh file metadata snapshot: {error}");
            }
        }
    }

    async fn query_one(&self, sql: &str, param: libsql::Value) -> Result<Option<FileMetadata>> {
        let db = self.db.lock().await;
        let mut rows = db.connection().query(sql, vec![param]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(parse_metadata(&row)?)),
            None => Ok(None),
        }
    }
}

async fn query_all(conn: &Connection) -> Result<Vec<FileMetadata>> {
    let mut rows = conn
        .query(
            &format!("SELECT {COLUMNS} FROM file_metadata ORDER BY created_at DESC, id DESC"),
            (),
        )
        .await?;
    let mut records = Vec::new();
    while let Some(row) = rows.next().await? {
        records.push(parse_metadata(&row)?);
    }
    Ok(records)
}

fn parse_metadata(row: &Row) -> Result<FileMetadata> {
    let tags_json: String = row.get(3)?;
    Ok(FileMetadata {
        id: row.get(0)?,
        original_file_name: row.get(1)?,
        file_path: row.get(2)?,
        tags: serde_json::from_str(&tags_json)?,
        created_at: row.get(4)?,
    })
}

impl FileMetadataStore for LibSqlFileMetadataStore {
    async fn get_all(&self) -> Result<Vec<FileMetadata>> {
        let db = self.db.lock().await;
        query_all(db.connection()).await
    }

    fn observe_all(&self) -> Snapshots<FileMetadata> {
        Snapshots::new(self.changes.subscribe())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<FileMetadata>> {
        self.query_one(
            &format!("SELECT {COLUMNS} FROM file_metadata WHERE id = ?"),
            libsql::Value::Integer(id),
        )
        .await
    }

    async fn get_by_path(&self, path: &str) -> Result<Option<FileMetadata>> {
        self.query_one(
            &format!("SELECT {COLUMNS} FROM file_metadata WHERE file_path = ? ORDER BY id LIMIT 1"),
            libsql::Value::Text(path.to_string()),
        )
        .await
    }

    async fn insert(&self, metadata: &FileMetadata) -> Result<i64> {
        if metadata.id < 0 {
            return Err(Error::InvalidInput(format!(
                "id must not be negative: {}",
                metadata.id
            )));
        }
        let tags = serde_json::to_string(&metadata.tags)?;

        let db = self.db.lock().await;
        let conn = db.connection();

        let id = if metadata.id == UNSAVED_ID {
            conn.execute(
                "INSERT INTO file_metadata (original_file_name, file_path, tags, created_at)
                 VALUES (?, ?, ?, ?)",
                params![
                    metadata.original_file_name.as_str(),
                    metadata.file_path.as_str(),
                    tags,
                    metadata.created_at
                ],
            )
            .await?;
            conn.last_insert_rowid()
        } else {
            conn.execute(
                "INSERT OR REPLACE INTO file_metadata
                     (id, original_file_name, file_path, tags, created_at)
                 VALUES (?, ?, ?, ?, ?)",
                params![
                    metadata.id,
                    metadata.original_file_name.as_str(),
                    metadata.file_path.as_str(),
                    tags,
                    metadata.created_at
                ],
            )
            .await?;
            metadata.id
        };

        tracing::debug!(id, path = %metadata.file_path, "Stored file metadata");
        self.publish(conn).await;
        Ok(id)
    }

    async fn update(&self, metadata: &FileMetadata) -> Result<()> {
        let tags = serde_json::to_string(&metadata.tags)?;

        let db = self.db.lock().await;
        let conn = db.connection();

        let rows = conn
            .execute(
                "UPDATE file_metadata
                 SET original_file_name = ?, file_path = ?, tags = ?, created_at = ?
                 WHERE id = ?",
                params![
                    metadata.original_file_name.as_str(),
                    metadata.file_path.as_str(),
                    tags,
                    metadata.created_at,
                    metadata.id
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("file metadata {}", metadata.id)));
        }

        self.publish(conn).await;
        Ok(())
    }

    async fn delete(&self, metadata: &FileMetadata) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let rows = conn
            .execute("DELETE FROM file_metadata WHERE id = ?", params![metadata.id])
            .await?;

        if rows > 0 {
            tracing::debug!(id = metadata.id, "Deleted file metadata");
            self.publish(conn).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn setup() -> LibSqlFileMetadataStore {
        let db = AppDatabase::open_in_memory().await.unwrap();
        db.file_metadata_store().await.unwrap()
    }

    fn record(path: &str, tags: &[&str]) -> FileMetadata {
        FileMetadata::new(
            path,
            path,
            tags.iter().map(ToString::to_string).collect(),
            1_700_000_000_000,
        )
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_insert_and_lookup_by_path() {
        let store = setup().await;
        let id = store.insert(&record("beach.jpg", &["trip", "sea"])).await.unwrap();
        assert_eq!(id, 1);

        let found = store.get_by_path("beach.jpg").await.unwrap().unwrap();
        assert_eq!(found.id, 1);
        assert_eq!(found.tags, vec!["trip".to_string(), "sea".to_string()]);
        assert!(store.get_by_path("missing.jpg").await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_lookup_by_id() {
        let store = setup().await;
        let id = store.insert(&record("a.png", &[])).await.unwrap();

        let found = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.file_path, "a.png");
        assert!(found.tags.is_empty());
        assert!(store.get_by_id(id + 1).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_explicit_id_insert_replaces() {
        let store = setup().await;
        let id = store.insert(&record("a.png", &["old"])).await.unwrap();

        let mut replacement = record("a.png", &["new"]);
        replacement.id = id;
        assert_eq!(store.insert(&replacement).await.unwrap(), id);

        let all = store.get_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].tags, vec!["new".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_update_missing_is_not_found() {
        let store = setup().await;
        let mut ghost = record("ghost.png", &[]);
        ghost.id = 9;

        let err = store.update(&ghost).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete_publishes_snapshot() {
        let store = setup().await;
        let id = store.insert(&record("a.png", &[])).await.unwrap();
        let mut snapshots = store.observe_all();
        assert_eq!(snapshots.next().await.unwrap().len(), 1);

        let mut doomed = record("a.png", &[]);
        doomed.id = id;
        store.delete(&doomed).await.unwrap();
        assert!(snapshots.next().await.unwrap().is_empty());

        store.delete(&doomed).await.unwrap();
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_largest_explicit_id_is_accepted() {
        let store = setup().await;
        let mut last = record("z.png", &[]);
        last.id = i64::MAX;

        assert_eq!(store.insert(&last).await.unwrap(), i64::MAX);
        assert_eq!(store.insert(&last).await.unwrap(), i64::MAX);

        assert!(store.insert(&record("a.png", &[])).await.is_err());
        assert_eq!(store.get_all().await.unwrap().len(), 1);
    }
}
