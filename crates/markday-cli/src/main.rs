//! MarkDay CLI - keep a Markdown diary from the terminal
//!
//! Entries, weather notes and moments live in the data directory
//! (`~/.markday` unless overridden).

mod cli;
mod commands;
mod error;
mod storage;


use clap::Parser;
use markday_core::files::FileManager;
use markday_core::settings::SettingsStore;
use markday_core::{DiaryStore, FileMetadataStore};
use tracing_subscriber::filter::{Directive, EnvFilter};

use crate::cli::{Cli, Commands};
use crate::commands::common::resolve_data_dir;
use crate::commands::config::run_config;
use crate::commands::drive::run_drive;
use crate::commands::entry::{run_add, run_delete, run_edit, run_list, run_show};
use crate::commands::export::run_export;
use crate::commands::moments::run_moments;
use crate::commands::weather::run_weather;
use crate::error::CliError;
use crate::storage::Storage;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive = "markday=info"
        .parse::<Directive>()
        .map_err(|error| CliError::Config(format!("Invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.in_memory {
        let storage = storage::in_memory();
        dispatch(cli.command, &storage).await
    } else {
        let data_dir = resolve_data_dir(cli.data_dir)?;
        let storage = storage::open_data_dir(&data_dir).await?;
        dispatch(cli.command, &storage).await
    }
}

async fn dispatch<D, M, F, S>(
    command: Commands,
    storage: &Storage<D, M, F, S>,
) -> Result<(), CliError>
where
    D: DiaryStore,
    M: FileMetadataStore,
    F: FileManager,
    S: SettingsStore,
{
    match command {
        Commands::Add {
            title,
            date,
            content,
        } => run_add(&storage.diary, &title, date.as_deref(), &content).await,
        Commands::List { json } => run_list(&storage.diary, json).await,
        Commands::Show { id, json } => run_show(&storage.diary, id, json).await,
        Commands::Edit {
            id,
            title,
            content,
            date,
        } => {
            run_edit(
                &storage.diary,
                id,
                title.as_deref(),
                content.as_deref(),
                date.as_deref(),
            )
            .await
        }
        Commands::Delete { ids } => run_delete(&storage.diary, &ids).await,
        Commands::Weather { mock, command } => {
            run_weather(command, mock, &storage.diary, &storage.settings).await
        }
        Commands::Moments { command } => run_moments(&storage.moments, command).await,
        Commands::Config { command } => {
            run_config(command, storage.settings.as_ref(), &storage.location).await
        }
        Commands::Drive { command } => {
            run_drive(command, &storage.diary, &storage.settings).await
        }
        Commands::Export { format, output } => {
            run_export(&storage.diary, format, output.as_deref()).await
        }
    }
}
