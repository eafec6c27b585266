use std::path::Path;

use markday_core::files::FileManager;
use markday_core::{FileMetadataStore, FileRepository};

use crate::cli::MomentCommands;
use crate::commands::common::{
    format_moment_lines, moment_to_list_item, normalize_tags, MomentListItem,
};
use crate::error::CliError;

pub async fn run_moments<F: FileManager, M: FileMetadataStore>(
    repo: &FileRepository<F, M>,
    command: MomentCommands,
) -> Result<(), CliError> {
    match command {
        MomentCommands::Add { path, tags } => run_moment_add(repo, &path, &tags).await,
        MomentCommands::List { json } => run_moment_list(repo, json).await,
        MomentCommands::Get { id, output } => run_moment_get(repo, id, &output).await,
        MomentCommands::Delete { id } => run_moment_delete(repo, id).await,
    }
}

pub fn moment_file_name(path: &Path) -> Result<String, CliError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(ToString::to_string)
        .ok_or_else(|| CliError::InvalidFilePath(path.display().to_string()))
}

pub async fn run_moment_add<F: FileManager, M: FileMetadataStore>(
    repo: &FileRepository<F, M>,
    path: &Path,
    tags: &[String],
) -> Result<(), CliError> {
    let file_name = moment_file_name(path)?;
    let content = tokio::fs::read(path).await?;

    let saved = repo
        .save_file(&file_name, &content, normalize_tags(tags))
        .await?;

    println!("{}", saved.id);
    Ok(())
}

pub async fn run_moment_list<F: FileManager, M: FileMetadataStore>(
    repo: &FileRepository<F, M>,
    as_json: bool,
) -> Result<(), CliError> {
    repo.ready().await;
    let moments = repo.files();

    if as_json {
        let json_items = moments
            .iter()
            .map(moment_to_list_item)
            .collect::<Vec<MomentListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else {
        for line in format_moment_lines(&moments) {
            println!("{line}");
        }
    }

    Ok(())
}

pub async fn run_moment_get<F: FileManager, M: FileMetadataStore>(
    repo: &FileRepository<F, M>,
    id: i64,
    output: &Path,
) -> Result<(), CliError> {
    let moment = repo
        .get_file_by_id(id)
        .await?
        .ok_or(CliError::MomentNotFound(id))?;
    let content = repo
        .get_file_content(&moment)
        .await?
        .ok_or(CliError::MomentNotFound(id))?;

    tokio::fs::write(output, content).await?;
    println!("{}", output.display());
    Ok(())
}

pub async fn run_moment_delete<F: FileManager, M: FileMetadataStore>(
    repo: &FileRepository<F, M>,
    id: i64,
) -> Result<(), CliError> {
    let moment = repo
        .get_file_by_id(id)
        .await?
        .ok_or(CliError::MomentNotFound(id))?;

    repo.delete_file(&moment).await?;
    println!("{}", moment.id);
    Ok(())
}
