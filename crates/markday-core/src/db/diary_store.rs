//! libSQL-backed diary entry store

use libsql::{params, Connection, Row};
use tokio::sync::watch;

use super::values::{optional_real, optional_text, real_or_null, text_or_null};
use super::AppDatabase;
use crate::error::{Error, Result};
use crate::models::{DiaryEntry, UNSAVED_ID};
use crate::store::{DiaryStore, Snapshots};
use crate::util::{date_from_epoch_days, epoch_days, instant_from_millis};

const SELECT_ALL: &str = "SELECT id, title, content, created_at, updated_at, entry_date,
        weather_condition, min_temperature, max_temperature
     FROM diary_entries
     ORDER BY entry_date DESC, id DESC";

/// Diary entries persisted in the `diary_entries` table.
///
/// The table has no change feed of its own, so the store re-reads the whole
/// table after each successful write and publishes the result.
pub struct LibSqlDiaryStore {
    db: AppDatabase,
    changes: watch::Sender<Vec<DiaryEntry>>,
}

impl LibSqlDiaryStore {
    /// Create a store and load the current table contents
    pub async fn new(db: AppDatabase) -> Result<Self> {
        let initial = {
            let guard = db.lock().await;
            query_all(guard.connection()).await?
        };
        let (changes, _) = watch::channel(initial);
        Ok(Self { db, changes })
    }

    /// Publish a fresh snapshot after a committed write.
    ///
    /// A failed re-read is logged and leaves observers on the previous
    /// snapshot; the write itself already succeeded.
    async fn publish(&self, conn: &Connection) {
        match query_all(conn).await {
            Ok(entries) => {
                self.changes.send_replace(entries);
            }
            Err(error) => {
                tracing::warn!("Failed to refresh diary entry snapshot: {error}");
            }
        }
    }
}

async fn query_all(conn: &Connection) -> Result<Vec<DiaryEntry>> {
    let mut rows = conn.query(SELECT_ALL, ()).await?;
    let mut entries = Vec::new();
    while let Some(row) = rows.next().await? {
        entries.push(parse_entry(&row)?);
    }
    Ok(entries)
}

async fn entry_exists(conn: &Connection, id: i64) -> Result<bool> {
    let mut rows = conn
        .query("SELECT 1 FROM diary_entries WHERE id = ?", params![id])
        .await?;
    Ok(rows.next().await?.is_some())
}

fn parse_entry(row: &Row) -> Result<DiaryEntry> {
    Ok(DiaryEntry {
        id: row.get(0)?,
        title: row.get(1)?,
        content: row.get(2)?,
        created_at: instant_from_millis(row.get(3)?),
        updated_at: instant_from_millis(row.get(4)?),
        entry_date: date_from_epoch_days(row.get(5)?),
        weather_condition: optional_text(row, 6)?,
        min_temperature: optional_real(row, 7)?,
        max_temperature: optional_real(row, 8)?,
    })
}

impl DiaryStore for LibSqlDiaryStore {
    async fn get_all(&self) -> Result<Vec<DiaryEntry>> {
        let db = self.db.lock().await;
        query_all(db.connection()).await
    }

    fn observe_all(&self) -> Snapshots<DiaryEntry> {
        Snapshots::new(self.changes.subscribe())
    }

    async fn insert(&self, entry: &DiaryEntry) -> Result<i64> {
        if entry.id < 0 {
            return Err(Error::InvalidInput(format!(
                "id must not be negative: {}",
                entry.id
            )));
        }

        let db = self.db.lock().await;
        let conn = db.connection();

        let id = if entry.id == UNSAVED_ID {
            conn.execute(
                "INSERT INTO diary_entries (title, content, created_at, updated_at, entry_date,
                    weather_condition, min_temperature, max_temperature)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    entry.title.as_str(),
                    entry.content.as_str(),
                    entry.created_at.timestamp_millis(),
                    entry.updated_at.timestamp_millis(),
                    epoch_days(entry.entry_date),
                    text_or_null(entry.weather_condition.as_deref()),
                    real_or_null(entry.min_temperature),
                    real_or_null(entry.max_temperature)
                ],
            )
            .await?;
            conn.last_insert_rowid()
        } else {
            if entry_exists(conn, entry.id).await? {
                return Err(Error::AlreadyExists(format!("diary entry {}", entry.id)));
            }
            conn.execute(
                "INSERT INTO diary_entries (id, title, content, created_at, updated_at, entry_date,
                    weather_condition, min_temperature, max_temperature)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                params![
                    entry.id,
                    entry.title.as_str(),
                    entry.content.as_str(),
                    entry.created_at.timestamp_millis(),
                    entry.updated_at.timestamp_millis(),
                    epoch_days(entry.entry_date),
                    text_or_null(entry.weather_condition.as_deref()),
                    real_or_null(entry.min_temperature),
                    real_or_null(entry.max_temperature)
                ],
            )
            .await?;
            entry.id
        };

        tracing::debug!(id, "Inserted diary entry");
        self.publish(conn).await;
        Ok(id)
    }

    async fn update(&self, entry: &DiaryEntry) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let rows = conn
            .execute(
                "UPDATE diary_entries
                 SET title = ?, content = ?, created_at = ?, updated_at = ?, entry_date = ?,
                     weather_condition = ?, min_temperature = ?, max_temperature = ?
                 WHERE id = ?",
                params![
                    entry.title.as_str(),
                    entry.content.as_str(),
                    entry.created_at.timestamp_millis(),
                    entry.updated_at.timestamp_millis(),
                    epoch_days(entry.entry_date),
                    text_or_null(entry.weather_condition.as_deref()),
                    real_or_null(entry.min_temperature),
                    real_or_null(entry.max_temperature),
                    entry.id
                ],
            )
            .await?;

        if rows == 0 {
            return Err(Error::NotFound(format!("diary entry {}", entry.id)));
        }

        tracing::debug!(id = entry.id, "Updated diary entry");
        self.publish(conn).await;
        Ok(())
    }

    async fn delete(&self, entry: &DiaryEntry) -> Result<()> {
        let db = self.db.lock().await;
        let conn = db.connection();

        let rows = conn
            .execute("DELETE FROM diary_entries WHERE id = ?", params![entry.id])
            .await?;

        if rows > 0 {
            tracing::debug!(id = entry.id, "Deleted diary entry");
            self.publish(conn).await;
        }
        Ok(())
    }
}
