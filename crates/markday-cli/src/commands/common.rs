use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use chrono::{Local, NaiveDate, Utc};
use markday_core::{DiaryEntry, DiaryRepository, DiaryStore, FileMetadata};
use serde::Serialize;

use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct EntryListItem {
    pub id: i64,
    pub title: String,
    pub date: String,
    pub preview: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub relative_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MomentListItem {
    pub id: i64,
    pub file_name: String,
    pub file_path: String,
    pub tags: Vec<String>,
    pub created_at: i64,
    pub relative_time: String,
}

pub fn resolve_data_dir(cli_data_dir: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(dir) = cli_data_dir.or_else(|| env::var_os("MARKDAY_HOME").map(PathBuf::from)) {
        return Ok(dir);
    }
    default_data_dir()
}

pub fn default_data_dir() -> Result<PathBuf, CliError> {
    dirs::home_dir()
        .map(|home| home.join(".markday"))
        .ok_or_else(|| CliError::Config("Failed to resolve home directory".to_string()))
}

/// Cached entry by id, once the repository has loaded
pub async fn find_entry<D: DiaryStore>(
    repo: &DiaryRepository<D>,
    id: i64,
) -> Result<DiaryEntry, CliError> {
    repo.ready().await;
    repo.get(id).ok_or(CliError::EntryNotFound(id))
}

/// Entries ordered newest day first, then newest id first
pub fn newest_first(mut entries: Vec<DiaryEntry>) -> Vec<DiaryEntry> {
    entries.sort_by(|a, b| b.entry_date.cmp(&a.entry_date).then(b.id.cmp(&a.id)));
    entries
}

pub fn parse_entry_date(value: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| CliError::InvalidDate(value.to_string()))
}

pub fn entry_date_or_today(value: Option<&str>) -> Result<NaiveDate, CliError> {
    value.map_or_else(|| Ok(Local::now().date_naive()), parse_entry_date)
}

pub fn normalize_title(title: &str) -> Result<String, CliError> {
    let collapsed = title.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        Err(CliError::EmptyTitle)
    } else {
        Ok(collapsed)
    }
}

/// Content from the arguments, else from piped stdin, else empty
pub fn resolve_entry_content(content_parts: &[String]) -> Result<String, CliError> {
    if let Some(content) = normalize_content(&content_parts.join(" ")) {
        return Ok(content);
    }

    Ok(read_piped_stdin()?.unwrap_or_default())
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn format_entry_lines(entries: &[DiaryEntry]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    entries
        .iter()
        .map(|entry| {
            let title = truncate(&entry.title, 32);
            let relative_time = format_relative_time(entry.updated_at.timestamp_millis(), now_ms);
            match format_weather(entry) {
                Some(weather) => format!(
                    "{:>5}  {}  {title:<32}  {relative_time:<10}  {weather}",
                    entry.id, entry.entry_date
                ),
                None => format!(
                    "{:>5}  {}  {title:<32}  {relative_time}",
                    entry.id, entry.entry_date
                ),
            }
        })
        .collect()
}

pub fn entry_to_list_item(entry: &DiaryEntry) -> EntryListItem {
    let now_ms = Utc::now().timestamp_millis();
    EntryListItem {
        id: entry.id,
        title: entry.title.clone(),
        date: entry.entry_date.to_string(),
        preview: truncate(&entry.content_preview(200), 80),
        created_at: entry.created_at.timestamp_millis(),
        updated_at: entry.updated_at.timestamp_millis(),
        relative_time: format_relative_time(entry.updated_at.timestamp_millis(), now_ms),
        weather: format_weather(entry),
    }
}

pub fn format_entry_detail(entry: &DiaryEntry) -> String {
    let mut lines = vec![
        format!("# {}", entry.title),
        format!("id: {}", entry.id),
        format!("date: {}", entry.entry_date),
        format!("updated: {}", entry.updated_at.format("%Y-%m-%d %H:%M UTC")),
    ];
    if let Some(weather) = format_weather(entry) {
        lines.push(format!("weather: {weather}"));
    }
    lines.push(String::new());
    lines.push(entry.content.clone());
    lines.join("\n")
}

pub fn format_weather(entry: &DiaryEntry) -> Option<String> {
    let condition = entry.weather_condition.as_deref()?;
    match (entry.min_temperature, entry.max_temperature) {
        (Some(min), Some(max)) => Some(format!("{condition} {min:.1}/{max:.1}°C")),
        _ => Some(condition.to_string()),
    }
}

pub fn format_moment_lines(moments: &[FileMetadata]) -> Vec<String> {
    let now_ms = Utc::now().timestamp_millis();
    moments
        .iter()
        .map(|moment| {
            let name = truncate(&moment.original_file_name, 32);
            let relative_time = format_relative_time(moment.created_at, now_ms);
            let tags = render_tags(&moment.tags);
            if tags.is_empty() {
                format!("{:>5}  {name:<32}  {relative_time}", moment.id)
            } else {
                format!("{:>5}  {name:<32}  {relative_time:<10}  {tags}", moment.id)
            }
        })
        .collect()
}

pub fn moment_to_list_item(moment: &FileMetadata) -> MomentListItem {
    let now_ms = Utc::now().timestamp_millis();
    MomentListItem {
        id: moment.id,
        file_name: moment.original_file_name.clone(),
        file_path: moment.file_path.clone(),
        tags: moment.tags.clone(),
        created_at: moment.created_at,
        relative_time: format_relative_time(moment.created_at, now_ms),
    }
}

pub fn render_tags(tags: &[String]) -> String {
    let mut tags = tags.to_vec();
    tags.sort();
    tags.into_iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<String>>()
        .join(" ")
}

/// Tags trimmed, without blanks or duplicates, in first-seen order
pub fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().trim_start_matches('#');
        if !tag.is_empty() && !normalized.iter().any(|seen| seen == tag) {
            normalized.push(tag.to_string());
        }
    }
    normalized
}

pub fn truncate(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let kept: String = collapsed.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}

const MINUTE_MS: i64 = 60_000;
const DAY_MS: i64 = 24 * 60 * MINUTE_MS;

/// Largest unit first; each applies once the age reaches its span
const RELATIVE_UNITS: [(i64, &str); 6] = [
    (365 * DAY_MS, "y"),
    (30 * DAY_MS, "mo"),
    (7 * DAY_MS, "w"),
    (DAY_MS, "d"),
    (60 * MINUTE_MS, "h"),
    (MINUTE_MS, "m"),
];

/// Compact age such as `5m ago`, `3d ago` or `just now`
pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let age = now_ms.saturating_sub(timestamp_ms);
    RELATIVE_UNITS
        .iter()
        .find(|(span, _)| age >= *span)
        .map_or_else(
            || "just now".to_string(),
            |(span, suffix)| format!("{}{suffix} ago", age / span),
        )
}

/// Show only the first characters of a secret
pub fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 4 {
        "****".to_string()
    } else {
        format!("{visible}****")
    }
}
