//! Clients for external services: weather data and cloud drive backup.

mod drive;
mod google_drive;
mod weather;

pub use drive::{
    CloudDriveClient, DriveFile, InMemoryCloudDriveClient, UserInfo, FOLDER_MIME_TYPE,
};
pub use google_drive::{GoogleDriveClient, DEFAULT_DRIVE_API_URL, DEFAULT_DRIVE_UPLOAD_URL};
pub use weather::{
    GoogleWeatherClient, MockWeatherClient, WeatherClient, DEFAULT_WEATHER_BASE_URL,
};

/// Errors reported by external service clients.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Weather API key is not set")]
    MissingApiKey,

    #[error("Not authorized with the cloud drive")]
    NotAuthorized,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid response payload: {0}")]
    InvalidPayload(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] crate::Error),
}

/// Result type for client operations
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Trim a configured API base URL and require an http(s) scheme
fn normalize_base_url(raw: &str) -> ClientResult<String> {
    let base = raw.trim().trim_end_matches('/').to_string();
    if base.is_empty() {
        return Err(ClientError::Api("API base URL must not be empty".to_string()));
    }
    if !(base.starts_with("https://") || base.starts_with("http://")) {
        return Err(ClientError::Api(
            "API base URL must include http:// or https://".to_string(),
        ));
    }
    Ok(base)
}
