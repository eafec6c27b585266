//! Database layer for `MarkDay`
//!
//! Uses libSQL as a local embedded database. Every store shares one
//! connection through [`AppDatabase`].

mod app_database;
mod connection;
mod diary_store;
mod file_metadata_store;
mod migrations;
mod settings_store;
mod values;

pub use app_database::AppDatabase;
pub use connection::Database;
pub use diary_store::LibSqlDiaryStore;
pub use file_metadata_store::LibSqlFileMetadataStore;
pub use settings_store::LibSqlSettingsStore;
