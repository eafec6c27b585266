pub mod common;
pub mod config;
pub mod drive;
pub mod entry;
pub mod export;
pub mod moments;
pub mod weather;
