//! Data models for MarkDay

mod diary_entry;
mod file_metadata;
mod weather;

pub use diary_entry::{DiaryEntry, UNSAVED_ID};
pub use file_metadata::FileMetadata;
pub use weather::{IntervalWeatherInfo, Location, WeatherInfo};
