//! Diary export and cloud backup helpers.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::clients::{ClientError, ClientResult, CloudDriveClient, DriveFile};
use crate::DiaryEntry;

/// Drive folder holding backups
pub const BACKUP_FOLDER_NAME: &str = "MarkDay";

/// File name of the backup inside [`BACKUP_FOLDER_NAME`]
pub const BACKUP_FILE_NAME: &str = "markday-backup.json";

/// Export output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Markdown => "md",
        }
    }
}

/// Serializable entry representation used in JSON and Markdown exports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEntry {
    pub id: i64,
    pub title: String,
    pub entry_date: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_condition: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_temperature: Option<f64>,
}

/// Convert an entry into an export record.
#[must_use]
pub fn entry_to_export_item(entry: &DiaryEntry) -> ExportEntry {
    ExportEntry {
        id: entry.id,
        title: entry.title.clone(),
        entry_date: entry.entry_date.format("%Y-%m-%d").to_string(),
        created_at: entry.created_at.timestamp_millis(),
        updated_at: entry.updated_at.timestamp_millis(),
        content: entry.content.clone(),
        weather_condition: entry.weather_condition.clone(),
        min_temperature: entry.min_temperature,
        max_temperature: entry.max_temperature,
    }
}

/// Entries in export order: oldest day first, then by id.
fn export_order(entries: &[DiaryEntry]) -> Vec<&DiaryEntry> {
    let mut ordered: Vec<&DiaryEntry> = entries.iter().collect();
    ordered.sort_by_key(|entry| (entry.entry_date, entry.id));
    ordered
}

/// Render entries as pretty-printed JSON.
pub fn render_json_export(entries: &[DiaryEntry]) -> serde_json::Result<String> {
    let items = export_order(entries)
        .into_iter()
        .map(entry_to_export_item)
        .collect::<Vec<ExportEntry>>();
    serde_json::to_string_pretty(&items)
}

/// Render entries in Markdown with frontmatter blocks.
#[must_use]
pub fn render_markdown_export(entries: &[DiaryEntry]) -> String {
    let mut output = String::new();

    for (index, entry) in export_order(entries).into_iter().enumerate() {
        if index > 0 {
            output.push('\n');
        }

        let item = entry_to_export_item(entry);
        let _ = writeln!(output, "---");
        let _ = writeln!(output, "id: {}", item.id);
        let _ = writeln!(output, "title: {}", frontmatter_string(&item.title));
        let _ = writeln!(output, "date: {}", item.entry_date);
        let _ = writeln!(output, "created_at: {}", item.created_at);
        let _ = writeln!(output, "updated_at: {}", item.updated_at);
        if let Some(condition) = &item.weather_condition {
            let _ = writeln!(output, "weather: {}", frontmatter_string(condition));
        }
        if let (Some(min), Some(max)) = (item.min_temperature, item.max_temperature) {
            let _ = writeln!(output, "temperature: {min:.1}..{max:.1}");
        }
        let _ = writeln!(output, "---");
        let _ = writeln!(output);
        output.push_str(&item.content);
        output.push('\n');
    }

    output
}

/// Double-quoted frontmatter scalar; line breaks and quotes are escaped.
fn frontmatter_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for ch in value.chars() {
        match ch {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\r' => quoted.push_str("\\r"),
            '\t' => quoted.push_str("\\t"),
            ch if ch.is_control() => {
                let _ = write!(quoted, "\\u{:04x}", u32::from(ch));
            }
            ch => quoted.push(ch),
        }
    }
    quoted.push('"');
    quoted
}

/// Render entries based on selected export format.
pub fn render_entries_export(
    entries: &[DiaryEntry],
    format: ExportFormat,
) -> serde_json::Result<String> {
    match format {
        ExportFormat::Json => render_json_export(entries),
        ExportFormat::Markdown => Ok(render_markdown_export(entries)),
    }
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, timestamp_ms: i64) -> String {
    format!("markday-export-{timestamp_ms}.{}", format.extension())
}

/// Upload a JSON export of `entries` to the drive.
///
/// The backup lives in a top-level `MarkDay` folder; both the folder and the
/// file are created on first use and the file is overwritten afterwards.
pub async fn backup_to_drive<D: CloudDriveClient>(
    drive: &D,
    entries: &[DiaryEntry],
) -> ClientResult<DriveFile> {
    if !drive.is_authorized().await {
        return Err(ClientError::NotAuthorized);
    }

    let payload = render_json_export(entries)
        .map_err(|error| ClientError::InvalidPayload(error.to_string()))?;

    let folder = match drive
        .list_files(None)
        .await?
        .into_iter()
        .find(|file| file.is_folder && file.name == BACKUP_FOLDER_NAME)
    {
        Some(folder) => folder,
        None => drive.create_folder(BACKUP_FOLDER_NAME, None).await?,
    };

    let existing = drive
        .list_files(Some(&folder.id))
        .await?
        .into_iter()
        .find(|file| !file.is_folder && file.name == BACKUP_FILE_NAME);

    let file = match existing {
        Some(file) => drive.update_file(&file.id, payload.as_bytes()).await?,
        None => {
            drive
                .create_file(
                    BACKUP_FILE_NAME,
                    payload.as_bytes(),
                    "application/json",
                    Some(&folder.id),
                )
                .await?
        }
    };

    tracing::info!(entries = entries.len(), file_id = %file.id, "Backed up diary to drive");
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{InMemoryCloudDriveClient, UserInfo};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn entry(id: i64, day: u32, title: &str) -> DiaryEntry {
        DiaryEntry::new(
            title,
            format!("Body of {title}"),
            NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
        )
        .with_id(id)
    }

    fn drive() -> InMemoryCloudDriveClient {
        InMemoryCloudDriveClient::signed_in(UserInfo {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            photo_url: None,
        })
    }

    #[test]
    fn json_export_sorts_by_date_then_id() {
        let entries = vec![entry(3, 2, "c"), entry(2, 1, "b"), entry(1, 2, "a")];
        let json = render_json_export(&entries).unwrap();
        let items: Vec<ExportEntry> = serde_json::from_str(&json).unwrap();

        let ids: Vec<i64> = items.iter().map(|item| item.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
        assert_eq!(items[0].entry_date, "2025-01-01");
    }

    #[test]
    fn markdown_export_includes_frontmatter_and_content() {
        let mut annotated = entry(7, 5, "Walk");
        annotated.weather_condition = Some("Rain".to_string());
        annotated.min_temperature = Some(3.0);
        annotated.max_temperature = Some(8.0);

        let rendered = render_markdown_export(&[annotated]);
        assert!(rendered.starts_with("---\nid: 7\ntitle: \"Walk\"\ndate: 2025-01-05\n"));
        assert!(rendered.contains("weather: \"Rain\""));
        assert!(rendered.contains("temperature: 3.0..8.0"));
        assert!(rendered.contains("---\n\nBody of Walk\n"));
    }

    #[test]
    fn markdown_export_escapes_titles_that_would_break_frontmatter() {
        let tricky = entry(1, 1, "first line\n---\nsays \"hi\" \\ bye");
        let rendered = render_markdown_export(&[tricky]);

        let frontmatter: Vec<&str> = rendered
            .lines()
            .take_while(|line| !line.is_empty())
            .collect();
        assert_eq!(frontmatter.iter().filter(|line| **line == "---").count(), 2);
        assert_eq!(
            frontmatter[2],
            r#"title: "first line\n---\nsays \"hi\" \\ bye""#
        );
    }

    #[test]
    fn suggested_export_file_name_uses_format_extension() {
        assert_eq!(
            suggested_export_file_name(ExportFormat::Json, 123),
            "markday-export-123.json"
        );
        assert_eq!(
            suggested_export_file_name(ExportFormat::Markdown, 456),
            "markday-export-456.md"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn backup_creates_then_updates_file() {
        let drive = drive();

        let first = backup_to_drive(&drive, &[entry(1, 1, "a")]).await.unwrap();
        let second = backup_to_drive(&drive, &[entry(1, 1, "a"), entry(2, 2, "b")])
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        let root = drive.list_files(None).await.unwrap();
        assert_eq!(root.len(), 1);
        assert_eq!(root[0].name, BACKUP_FOLDER_NAME);

        let bytes = drive.download_file(&second.id).await.unwrap();
        let items: Vec<ExportEntry> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn backup_requires_authorization() {
        let drive = drive();
        drive.sign_out().await.unwrap();

        let err = backup_to_drive(&drive, &[]).await.unwrap_err();
        assert!(matches!(err, ClientError::NotAuthorized));
    }
}
