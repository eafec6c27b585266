use std::io;

use markday_core::clients::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] markday_core::Error),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Entry title cannot be empty")]
    EmptyTitle,
    #[error("Invalid date `{0}`, expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("Entry not found: {0}")]
    EntryNotFound(i64),
    #[error("Moment not found: {0}")]
    MomentNotFound(i64),
    #[error("Nothing to change; pass --title, --content or --date")]
    NothingToEdit,
    #[error("Invalid file path: {0}")]
    InvalidFilePath(String),
    #[error("No weather data available for {0}")]
    NoWeatherData(String),
    #[error("Configuration error: {0}")]
    Config(String),
}
