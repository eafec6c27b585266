use markday_core::settings::SettingsStore;

use crate::cli::ConfigCommands;
use crate::commands::common::mask_secret;
use crate::error::CliError;
use crate::storage::StorageLocation;

pub async fn run_config<S: SettingsStore>(
    command: ConfigCommands,
    settings: &S,
    location: &StorageLocation,
) -> Result<(), CliError> {
    match command {
        ConfigCommands::Show => run_config_show(settings, location).await,
        ConfigCommands::SetWeatherKey { key } => {
            if key.trim().is_empty() {
                return Err(CliError::Config("Weather API key cannot be empty".to_string()));
            }
            settings.set_weather_api_key(Some(key)).await?;
            println!("Weather API key saved");
            Ok(())
        }
        ConfigCommands::ClearWeatherKey => {
            settings.set_weather_api_key(None).await?;
            println!("Weather API key removed");
            Ok(())
        }
    }
}

async fn run_config_show<S: SettingsStore>(
    settings: &S,
    location: &StorageLocation,
) -> Result<(), CliError> {
    match location {
        StorageLocation::InMemory => println!("storage: in-memory"),
        StorageLocation::Directory { db_path, files_dir } => {
            println!("database: {}", db_path.display());
            println!("files: {}", files_dir.display());
        }
    }

    let key = settings.weather_api_key().await?;
    match key {
        Some(key) => println!("weather_api_key: {}", mask_secret(&key)),
        None => println!("weather_api_key: (not set)"),
    }
    match settings.drive_access_token().await? {
        Some(token) => println!("drive_access_token: {}", mask_secret(&token)),
        None => println!("drive_access_token: (not set)"),
    }
    Ok(())
}
