//! Settings persisted in the application database

use libsql::Connection;
use tokio::sync::watch;

use super::AppDatabase;
use crate::error::Result;
use crate::settings::{SettingsStore, DRIVE_ACCESS_TOKEN, WEATHER_API_KEY};
use crate::util::normalize_text_option;

/// libSQL implementation of [`SettingsStore`] over the `settings` table
pub struct LibSqlSettingsStore {
    db: AppDatabase,
    weather_api_key: watch::Sender<Option<String>>,
}

impl LibSqlSettingsStore {
    /// Create a store and load the stored key
    pub async fn new(db: AppDatabase) -> Result<Self> {
        let initial = {
            let guard = db.lock().await;
            get_setting(guard.connection(), WEATHER_API_KEY).await?
        };
        Ok(Self {
            db,
            weather_api_key: watch::Sender::new(initial),
        })
    }
}

async fn get_setting(conn: &Connection, key: &str) -> Result<Option<String>> {
    let mut rows = conn
        .query("SELECT value FROM settings WHERE key = ?", [key])
        .await?;

    if let Some(row) = rows.next().await? {
        let value: String = row.get(0)?;
        Ok(Some(value))
    } else {
        Ok(None)
    }
}

async fn set_setting(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
        [key, value],
    )
    .await?;
    Ok(())
}

/// Write `value`, or remove the key when it is `None`
async fn store_setting(conn: &Connection, key: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(value) => set_setting(conn, key, value).await,
        None => remove_setting(conn, key).await,
    }
}

async fn remove_setting(conn: &Connection, key: &str) -> Result<()> {
    conn.execute("DELETE FROM settings WHERE key = ?", [key]).await?;
    Ok(())
}

impl SettingsStore for LibSqlSettingsStore {
    async fn weather_api_key(&self) -> Result<Option<String>> {
        let db = self.db.lock().await;
        get_setting(db.connection(), WEATHER_API_KEY).await
    }

    fn observe_weather_api_key(&self) -> watch::Receiver<Option<String>> {
        self.weather_api_key.subscribe()
    }

    async fn set_weather_api_key(&self, key: Option<String>) -> Result<()> {
        let key = normalize_text_option(key);
        let db = self.db.lock().await;

        store_setting(db.connection(), WEATHER_API_KEY, key.as_deref()).await?;
        tracing::debug!(present = key.is_some(), "Updated weather API key");

        self.weather_api_key.send_if_modified(|current| {
            if *current == key {
                false
            } else {
                *current = key;
                true
            }
        });
        Ok(())
    }

    async fn drive_access_token(&self) -> Result<Option<String>> {
        let db = self.db.lock().await;
        get_setting(db.connection(), DRIVE_ACCESS_TOKEN).await
    }

    async fn set_drive_access_token(&self, token: Option<String>) -> Result<()> {
        let token = normalize_text_option(token);
        let db = self.db.lock().await;
        store_setting(db.connection(), DRIVE_ACCESS_TOKEN, token.as_deref()).await?;
        tracing::debug!(present = token.is_some(), "Updated drive access token");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    async fn setup() -> LibSqlSettingsStore {
        let db = AppDatabase::open_in_memory().await.unwrap();
        db.settings_store().await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_key_defaults_to_none() {
        let settings = setup().await;
        assert_eq!(settings.weather_api_key().await.unwrap(), None);
        assert_eq!(*settings.observe_weather_api_key().borrow(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_set_replace_and_remove() {
        let settings = setup().await;

        settings
            .set_weather_api_key(Some("first".to_string()))
            .await
            .unwrap();
        settings
            .set_weather_api_key(Some("second".to_string()))
            .await
            .unwrap();
        assert_eq!(
            settings.weather_api_key().await.unwrap().as_deref(),
            Some("second")
        );

        settings.set_weather_api_key(None).await.unwrap();
        assert_eq!(settings.weather_api_key().await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_observer_sees_new_key() {
        let settings = setup().await;
        let mut rx = settings.observe_weather_api_key();

        settings
            .set_weather_api_key(Some("live".to_string()))
            .await
            .unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().as_deref(), Some("live"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_key_survives_reopen() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("markday.db");

        {
            let db = AppDatabase::open_path(&path).await.unwrap();
            let settings = db.settings_store().await.unwrap();
            settings
                .set_weather_api_key(Some(" persisted ".to_string()))
                .await
                .unwrap();
        }

        let db = AppDatabase::open_path(&path).await.unwrap();
        let settings = db.settings_store().await.unwrap();
        assert_eq!(
            settings.weather_api_key().await.unwrap().as_deref(),
            Some("persisted")
        );
        assert_eq!(
            settings.observe_weather_api_key().borrow().as_deref(),
            Some("persisted")
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_drive_token_survives_reopen_and_clears() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("markday.db");

        {
            let db = AppDatabase::open_path(&path).await.unwrap();
            let settings = db.settings_store().await.unwrap();
            settings
                .set_drive_access_token(Some("ya29.token".to_string()))
                .await
                .unwrap();
        }

        let db = AppDatabase::open_path(&path).await.unwrap();
        let settings = db.settings_store().await.unwrap();
        assert_eq!(
            settings.drive_access_token().await.unwrap().as_deref(),
            Some("ya29.token")
        );
        assert_eq!(settings.weather_api_key().await.unwrap(), None);

        settings.set_drive_access_token(None).await.unwrap();
        assert_eq!(settings.drive_access_token().await.unwrap(), None);
    }
}
