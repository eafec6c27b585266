use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use markday_core::clients::{GoogleWeatherClient, MockWeatherClient, WeatherClient};
use markday_core::models::Location;
use markday_core::settings::SettingsStore;
use markday_core::{DiaryRepository, DiaryStore};

use crate::cli::WeatherCommands;
use crate::commands::common::{find_entry, format_weather};
use crate::error::CliError;

pub async fn run_weather<D: DiaryStore, S: SettingsStore>(
    command: WeatherCommands,
    use_mock: bool,
    repo: &DiaryRepository<D>,
    settings: &Arc<S>,
) -> Result<(), CliError> {
    if use_mock {
        run_weather_with(&MockWeatherClient, command, repo).await
    } else {
        let client = GoogleWeatherClient::new(Arc::clone(settings))?;
        run_weather_with(&client, command, repo).await
    }
}

async fn run_weather_with<W: WeatherClient, D: DiaryStore>(
    client: &W,
    command: WeatherCommands,
    repo: &DiaryRepository<D>,
) -> Result<(), CliError> {
    match command {
        WeatherCommands::Current { lat, lon } => {
            let info = client.get_weather(Location::new(lat, lon)).await?;
            println!(
                "{}: {:.1}°C, humidity {}%, wind {:.1} km/h",
                info.condition, info.temperature, info.humidity, info.wind_speed
            );
            Ok(())
        }
        WeatherCommands::Annotate { id, lat, lon } => {
            run_annotate(client, repo, id, Location::new(lat, lon)).await
        }
    }
}

pub async fn run_annotate<W: WeatherClient, D: DiaryStore>(
    client: &W,
    repo: &DiaryRepository<D>,
    id: i64,
    location: Location,
) -> Result<(), CliError> {
    let mut entry = find_entry(repo, id).await?;
    let (start, end) = day_bounds(entry.entry_date);

    let hours = client.get_hourly_history(location, start, end).await?;
    if !entry.annotate_weather(&hours) {
        return Err(CliError::NoWeatherData(entry.entry_date.to_string()));
    }
    entry.touch();
    repo.update(&entry).await?;

    println!("{}: {}", entry.id, format_weather(&entry).unwrap_or_default());
    Ok(())
}

/// UTC instants covering a calendar day
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    (start, start + Duration::days(1))
}
