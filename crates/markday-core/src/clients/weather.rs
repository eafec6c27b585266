//! Weather lookups backed by the Google Weather API.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::{normalize_base_url, ClientError, ClientResult};
use crate::models::{IntervalWeatherInfo, Location, WeatherInfo};
use crate::settings::SettingsStore;
use crate::util::compact_text;

/// Production endpoint of the Google Weather API
pub const DEFAULT_WEATHER_BASE_URL: &str = "https://weather.googleapis.com/v1";

const HOURS_PER_LOOKUP: &str = "24";

/// Source of current, forecast and historical weather.
pub trait WeatherClient: Send + Sync {
    /// Current conditions at `location`.
    fn get_weather(
        &self,
        location: Location,
    ) -> impl Future<Output = ClientResult<WeatherInfo>> + Send;

    /// Hour-by-hour forecast starting now.
    fn get_hourly_forecast(
        &self,
        location: Location,
    ) -> impl Future<Output = ClientResult<Vec<IntervalWeatherInfo>>> + Send;

    /// Hour-by-hour history restricted to intervals overlapping `[start, end)`.
    fn get_hourly_history(
        &self,
        location: Location,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Future<Output = ClientResult<Vec<IntervalWeatherInfo>>> + Send;
}

/// HTTP client for the Google Weather API.
///
/// The API key is read from the settings store on every call, so key changes
/// take effect without rebuilding the client.
#[derive(Debug)]
pub struct GoogleWeatherClient<S: SettingsStore> {
    settings: Arc<S>,
    base_url: String,
    client: reqwest::Client,
}

impl<S: SettingsStore> GoogleWeatherClient<S> {
    /// Client for the production endpoint
    pub fn new(settings: Arc<S>) -> ClientResult<Self> {
        Self::with_base_url(settings, DEFAULT_WEATHER_BASE_URL)
    }

    /// Client for an explicit API base URL
    pub fn with_base_url(settings: Arc<S>, base_url: impl Into<String>) -> ClientResult<Self> {
        let base_url = normalize_base_url(&base_url.into())?;
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            settings,
            base_url,
            client,
        })
    }

    /// Returns the base URL this client was configured with.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn api_key(&self) -> ClientResult<String> {
        self.settings
            .weather_api_key()
            .await?
            .ok_or(ClientError::MissingApiKey)
    }

    async fn fetch(&self, route: &str, location: Location, hours: bool) -> ClientResult<String> {
        let api_key = self.api_key().await?;
        let mut query = vec![
            ("key", api_key),
            ("location.latitude", location.latitude.to_string()),
            ("location.longitude", location.longitude.to_string()),
            ("unitsSystem", "METRIC".to_string()),
        ];
        if hours {
            query.push(("hours", HOURS_PER_LOOKUP.to_string()));
        }

        let response = self
            .client
            .get(format!("{}{}", self.base_url, route))
            .header("Accept", "application/json")
            .query(&query)
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Api(format!(
                "Weather request failed with HTTP {status}: {}",
                compact_text(&body)
            )));
        }
        Ok(response.text().await?)
    }
}

impl<S: SettingsStore> WeatherClient for GoogleWeatherClient<S> {
    async fn get_weather(&self, location: Location) -> ClientResult<WeatherInfo> {
        let body = self.fetch("/currentConditions:lookup", location, false).await?;
        parse_current_conditions(&body)
    }

    async fn get_hourly_forecast(
        &self,
        location: Location,
    ) -> ClientResult<Vec<IntervalWeatherInfo>> {
        let body = self.fetch("/forecast/hours:lookup", location, true).await?;
        parse_forecast_hours(&body)
    }

    async fn get_hourly_history(
        &self,
        location: Location,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> ClientResult<Vec<IntervalWeatherInfo>> {
        let body = self.fetch("/history/hours:lookup", location, true).await?;
        let hours = parse_history_hours(&body)?;
        Ok(hours
            .into_iter()
            .filter(|hour| hour.overlaps(start, end))
            .collect())
    }
}

/// Offline client returning a fixed reading
#[derive(Debug, Clone, Copy, Default)]
pub struct MockWeatherClient;

impl WeatherClient for MockWeatherClient {
    async fn get_weather(&self, _location: Location) -> ClientResult<WeatherInfo> {
        Ok(WeatherInfo {
            temperature: 20.0,
            condition: "Sunny".to_string(),
            humidity: 50,
            wind_speed: 10.0,
            location_name: "Mock Location".to_string(),
            icon_url: None,
        })
    }

    async fn get_hourly_forecast(
        &self,
        _location: Location,
    ) -> ClientResult<Vec<IntervalWeatherInfo>> {
        Ok(Vec::new())
    }

    async fn get_hourly_history(
        &self,
        _location: Location,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> ClientResult<Vec<IntervalWeatherInfo>> {
        Ok(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CurrentConditionsResponse {
    temperature: Temperature,
    weather_condition: WeatherCondition,
    relative_humidity: i32,
    wind: Wind,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ForecastResponse {
    #[serde(default)]
    forecast_hours: Vec<HourlyItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HistoryResponse {
    #[serde(default)]
    history_hours: Vec<HourlyItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HourlyItem {
    interval: Interval,
    temperature: Temperature,
    weather_condition: WeatherCondition,
    relative_humidity: i32,
    wind: Wind,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Interval {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct Temperature {
    degrees: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WeatherCondition {
    description: Description,
    #[serde(default)]
    icon_base_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Description {
    text: String,
}

#[derive(Debug, Deserialize)]
struct Wind {
    speed: Speed,
}

#[derive(Debug, Deserialize)]
struct Speed {
    #[serde(default)]
    value: f64,
}

impl HourlyItem {
    fn into_interval(self) -> IntervalWeatherInfo {
        IntervalWeatherInfo {
            start_time: self.interval.start_time,
            end_time: self.interval.end_time,
            min_temperature: self.temperature.degrees,
            max_temperature: self.temperature.degrees,
            condition: self.weather_condition.description.text,
            humidity: self.relative_humidity,
            wind_speed: self.wind.speed.value,
            icon_url: self.weather_condition.icon_base_uri,
        }
    }
}

fn decode<'a, T: Deserialize<'a>>(body: &'a str) -> ClientResult<T> {
    serde_json::from_str(body).map_err(|error| {
        ClientError::InvalidPayload(format!("{error}: {}", compact_text(body)))
    })
}

fn parse_current_conditions(body: &str) -> ClientResult<WeatherInfo> {
    let response: CurrentConditionsResponse = decode(body)?;
    Ok(WeatherInfo {
        temperature: response.temperature.degrees,
        condition: response.weather_condition.description.text,
        humidity: response.relative_humidity,
        wind_speed: response.wind.speed.value,
        location_name: "Current Location".to_string(),
        icon_url: response.weather_condition.icon_base_uri,
    })
}

fn parse_forecast_hours(body: &str) -> ClientResult<Vec<IntervalWeatherInfo>> {
    let response: ForecastResponse = decode(body)?;
    Ok(response
        .forecast_hours
        .into_iter()
        .map(HourlyItem::into_interval)
        .collect())
}

fn parse_history_hours(body: &str) -> ClientResult<Vec<IntervalWeatherInfo>> {
    let response: HistoryResponse = decode(body)?;
    Ok(response
        .history_hours
        .into_iter()
        .map(HourlyItem::into_interval)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::InMemorySettingsStore;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn hourly_item(start: &str, end: &str, degrees: f64, text: &str) -> String {
        format!(
            r#"{{
                "interval": {{ "startTime": "{start}", "endTime": "{end}" }},
                "temperature": {{ "degrees": {degrees}, "unit": "CELSIUS" }},
                "weatherCondition": {{
                    "iconBaseUri": "https://maps.gstatic.com/weather/v1/cloudy",
                    "description": {{ "text": "{text}", "languageCode": "en" }},
                    "type": "CLOUDY"
                }},
                "relativeHumidity": 70,
                "wind": {{ "speed": {{ "value": 12, "unit": "KILOMETERS_PER_HOUR" }} }}
            }}"#
        )
    }

    #[test]
    fn parses_current_conditions() {
        let body = r#"{
            "currentTime": "2025-06-01T10:00:00Z",
            "isDaytime": true,
            "weatherCondition": {
                "description": { "text": "Sunny", "languageCode": "en" },
                "type": "CLEAR"
            },
            "temperature": { "degrees": 21.5, "unit": "CELSIUS" },
            "relativeHumidity": 40,
            "wind": { "speed": { "value": 8, "unit": "KILOMETERS_PER_HOUR" } }
        }"#;

        let info = parse_current_conditions(body).unwrap();
        assert_eq!(info.temperature, 21.5);
        assert_eq!(info.condition, "Sunny");
        assert_eq!(info.humidity, 40);
        assert_eq!(info.wind_speed, 8.0);
        assert_eq!(info.icon_url, None);
    }

    #[test]
    fn parses_forecast_hours() {
        let body = format!(
            r#"{{ "forecastHours": [{}], "timeZone": {{ "id": "UTC" }} }}"#,
            hourly_item("2025-06-01T10:00:00Z", "2025-06-01T11:00:00Z", 14.0, "Cloudy")
        );

        let hours = parse_forecast_hours(&body).unwrap();
        assert_eq!(hours.len(), 1);
        assert_eq!(hours[0].min_temperature, 14.0);
        assert_eq!(hours[0].max_temperature, 14.0);
        assert_eq!(hours[0].condition, "Cloudy");
        assert_eq!(hours[0].wind_speed, 12.0);
        assert_eq!(
            hours[0].start_time,
            Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
        );
    }

    #[test]
    fn parses_empty_history() {
        assert!(parse_history_hours("{}").unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_payloads() {
        let err = parse_current_conditions(r#"{"temperature": "warm"}"#).unwrap_err();
        assert!(matches!(err, ClientError::InvalidPayload(_)));
    }

    #[test]
    fn normalize_base_url_rejects_invalid_values() {
        assert!(normalize_base_url("").is_err());
        assert!(normalize_base_url("weather.example.com").is_err());
        assert_eq!(
            normalize_base_url("http://localhost:8080/v1/").unwrap(),
            "http://localhost:8080/v1"
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn missing_key_fails_before_any_request() {
        let settings = Arc::new(InMemorySettingsStore::new());
        let client = GoogleWeatherClient::new(settings).unwrap();

        let err = client
            .get_weather(Location::new(52.52, 13.405))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::MissingApiKey));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn mock_client_returns_fixed_reading() {
        let client = MockWeatherClient;
        let location = Location::new(0.0, 0.0);

        let info = client.get_weather(location).await.unwrap();
        assert_eq!(info.condition, "Sunny");
        assert_eq!(info.temperature, 20.0);
        assert!(client.get_hourly_forecast(location).await.unwrap().is_empty());
        assert!(client
            .get_hourly_history(location, Utc::now(), Utc::now())
            .await
            .unwrap()
            .is_empty());
    }
}
