//! markday-core - Core library for MarkDay
//!
//! This crate contains the models, storage backends, repositories and service
//! clients shared by every MarkDay front end.

pub mod clients;
pub mod db;
pub mod error;
pub mod export;
pub mod files;
pub mod models;
pub mod repository;
pub mod settings;
pub mod store;
pub mod util;

pub use error::{Error, Result};
pub use models::{DiaryEntry, FileMetadata, UNSAVED_ID};
pub use repository::{DiaryRepository, FileRepository};
pub use store::{DiaryStore, FileMetadataStore, Snapshots};
