use markday_core::{DiaryEntry, DiaryRepository, DiaryStore};

use crate::commands::common::{
    entry_date_or_today, entry_to_list_item, find_entry, format_entry_detail, format_entry_lines,
    newest_first, normalize_title, parse_entry_date, resolve_entry_content, EntryListItem,
};
use crate::error::CliError;

pub async fn run_add<D: DiaryStore>(
    repo: &DiaryRepository<D>,
    title: &str,
    date: Option<&str>,
    content_parts: &[String],
) -> Result<(), CliError> {
    let title = normalize_title(title)?;
    let entry_date = entry_date_or_today(date)?;
    let content = resolve_entry_content(content_parts)?;

    let id = repo
        .insert(&DiaryEntry::new(title, content, entry_date))
        .await?;

    println!("{id}");
    Ok(())
}

pub async fn run_list<D: DiaryStore>(
    repo: &DiaryRepository<D>,
    as_json: bool,
) -> Result<(), CliError> {
    repo.ready().await;
    let entries = newest_first(repo.entries());

    if as_json {
        let json_items = entries
            .iter()
            .map(entry_to_list_item)
            .collect::<Vec<EntryListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_entry_lines(&entries) {
            println!("{line}");
        }
    }

    Ok(())
}

pub async fn run_show<D: DiaryStore>(
    repo: &DiaryRepository<D>,
    id: i64,
    as_json: bool,
) -> Result<(), CliError> {
    let entry = find_entry(repo, id).await?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&entry)?);
    } else {
        println!("{}", format_entry_detail(&entry));
    }
    Ok(())
}

pub async fn run_edit<D: DiaryStore>(
    repo: &DiaryRepository<D>,
    id: i64,
    title: Option<&str>,
    content: Option<&str>,
    date: Option<&str>,
) -> Result<(), CliError> {
    if title.is_none() && content.is_none() && date.is_none() {
        return Err(CliError::NothingToEdit);
    }

    let mut entry = find_entry(repo, id).await?;
    if let Some(title) = title {
        entry.title = normalize_title(title)?;
    }
    if let Some(content) = content {
        entry.content = content.trim().to_string();
    }
    if let Some(date) = date {
        entry.entry_date = parse_entry_date(date)?;
    }
    entry.touch();

    repo.update(&entry).await?;
    println!("{}", entry.id);
    Ok(())
}

pub async fn run_delete<D: DiaryStore>(
    repo: &DiaryRepository<D>,
    ids: &[i64],
) -> Result<(), CliError> {
    let mut selected = Vec::with_capacity(ids.len());
    for id in ids {
        selected.push(find_entry(repo, *id).await?);
    }

    repo.delete_all(&selected).await?;
    for entry in &selected {
        println!("{}", entry.id);
    }
    Ok(())
}
