//! User preferences consumed by the service clients

use std::future::Future;

use tokio::sync::{watch, RwLock};

use crate::error::Result;
use crate::util::normalize_text_option;

/// Preference key holding the weather provider API key
pub const WEATHER_API_KEY: &str = "weather_api_key";

/// Preference key holding the cloud drive OAuth access token
pub const DRIVE_ACCESS_TOKEN: &str = "drive_access_token";

/// Observable preference storage.
pub trait SettingsStore: Send + Sync + 'static {
    /// Current weather API key, if one is set.
    fn weather_api_key(&self) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Live view of the weather API key.
    fn observe_weather_api_key(&self) -> watch::Receiver<Option<String>>;

    /// Store a new key. `None` (or a blank key) removes it.
    fn set_weather_api_key(&self, key: Option<String>) -> impl Future<Output = Result<()>> + Send;

    /// Bearer token for the cloud drive, if signed in.
    fn drive_access_token(&self) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Store a new token. `None` (or a blank token) signs out.
    fn set_drive_access_token(
        &self,
        token: Option<String>,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Settings kept only for the lifetime of the process
#[derive(Debug)]
pub struct InMemorySettingsStore {
    weather_api_key: watch::Sender<Option<String>>,
    drive_access_token: RwLock<Option<String>>,
}

impl InMemorySettingsStore {
    pub fn new() -> Self {
        Self {
            weather_api_key: watch::Sender::new(None),
            drive_access_token: RwLock::new(None),
        }
    }

    /// Start with `key` already configured
    pub fn with_weather_api_key(key: impl Into<String>) -> Self {
        Self {
            weather_api_key: watch::Sender::new(normalize_text_option(Some(key.into()))),
            drive_access_token: RwLock::new(None),
        }
    }
}

impl Default for InMemorySettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsStore for InMemorySettingsStore {
    async fn weather_api_key(&self) -> Result<Option<String>> {
        Ok(self.weather_api_key.borrow().clone())
    }

    fn observe_weather_api_key(&self) -> watch::Receiver<Option<String>> {
        self.weather_api_key.subscribe()
    }

    async fn set_weather_api_key(&self, key: Option<String>) -> Result<()> {
        let key = normalize_text_option(key);
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
        Ok(self.drive_access_token.read().await.clone())
    }

    async fn set_drive_access_token(&self, token: Option<String>) -> Result<()> {
        *self.drive_access_token.write().await = normalize_text_option(token);
        Ok(())
    }
}
