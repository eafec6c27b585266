use std::sync::Arc;

use markday_core::clients::{ClientError, CloudDriveClient, GoogleDriveClient};
use markday_core::export::{backup_to_drive, BACKUP_FOLDER_NAME};
use markday_core::settings::SettingsStore;
use markday_core::{DiaryRepository, DiaryStore};

use crate::cli::DriveCommands;
use crate::error::CliError;

/// Environment variable consulted when `drive sign-in` gets no token
pub const DRIVE_TOKEN_ENV: &str = "MARKDAY_DRIVE_TOKEN";

pub async fn run_drive<D: DiaryStore, S: SettingsStore>(
    command: DriveCommands,
    repo: &DiaryRepository<D>,
    settings: &Arc<S>,
) -> Result<(), CliError> {
    let client = GoogleDriveClient::new(Arc::clone(settings))?;
    run_drive_with(&client, command, settings.as_ref(), repo).await
}

pub async fn run_drive_with<C, S, D>(
    client: &C,
    command: DriveCommands,
    settings: &S,
    repo: &DiaryRepository<D>,
) -> Result<(), CliError>
where
    C: CloudDriveClient,
    S: SettingsStore,
    D: DiaryStore,
{
    match command {
        DriveCommands::Status => {
            match client.get_user_info().await? {
                Some(user) => println!("Signed in as {} <{}>", user.name, user.email),
                None => println!("Not signed in"),
            }
            Ok(())
        }
        DriveCommands::SignIn { token } => {
            let token = resolve_drive_token(token)?;
            settings.set_drive_access_token(Some(token)).await?;

            if !client.authorize().await? {
                settings.set_drive_access_token(None).await?;
                return Err(ClientError::NotAuthorized.into());
            }
            match client.get_user_info().await? {
                Some(user) => println!("Signed in as {} <{}>", user.name, user.email),
                None => println!("Signed in"),
            }
            Ok(())
        }
        DriveCommands::SignOut => {
            client.sign_out().await?;
            settings.set_drive_access_token(None).await?;
            println!("Signed out");
            Ok(())
        }
        DriveCommands::Backup => {
            let entries = repo.store().get_all().await?;
            let file = backup_to_drive(client, &entries).await?;
            tracing::info!(file_id = %file.id, entries = entries.len(), "Backed up diary");
            println!(
                "Backed up {} entries to {BACKUP_FOLDER_NAME}/{} ({})",
                entries.len(),
                file.name,
                file.id
            );
            Ok(())
        }
    }
}

/// Token from the command line, else from the environment
fn resolve_drive_token(token: Option<String>) -> Result<String, CliError> {
    token
        .or_else(|| std::env::var(DRIVE_TOKEN_ENV).ok())
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            CliError::Config(format!(
                "No drive access token; pass one or set {DRIVE_TOKEN_ENV}"
            ))
        })
}
