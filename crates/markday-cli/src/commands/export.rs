use std::path::Path;

use markday_core::export::{render_json_export, render_markdown_export};
use markday_core::{DiaryRepository, DiaryStore};

use crate::cli::ExportFormat;
use crate::error::CliError;

pub async fn run_export<D: DiaryStore>(
    repo: &DiaryRepository<D>,
    format: ExportFormat,
    output_path: Option<&Path>,
) -> Result<(), CliError> {
    let entries = repo.store().get_all().await?;
    let rendered = match format {
        ExportFormat::Json => render_json_export(&entries)?,
        ExportFormat::Markdown => render_markdown_export(&entries),
    };

    if let Some(path) = output_path {
        tokio::fs::write(path, rendered).await?;
        println!("{}", path.display());
    } else {
        println!("{rendered}");
    }

    Ok(())
}
