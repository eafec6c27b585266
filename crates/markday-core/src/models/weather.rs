//! Weather models returned by weather clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Current weather at a location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherInfo {
    /// Temperature in Celsius
    pub temperature: f64,
    /// Condition text, e.g. "Sunny"
    pub condition: String,
    /// Relative humidity, 0-100
    pub humidity: i32,
    /// Wind speed in km/h
    pub wind_speed: f64,
    /// Display name of the location
    pub location_name: String,
    #[serde(default)]
    pub icon_url: Option<String>,
}

/// Weather over a time interval (usually one hour)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntervalWeatherInfo {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Minimum temperature in Celsius
    pub min_temperature: f64,
    /// Maximum temperature in Celsius
    pub max_temperature: f64,
    pub condition: String,
    pub humidity: i32,
    /// Wind speed in km/h
    pub wind_speed: f64,
    #[serde(default)]
    pub icon_url: Option<String>,
}

impl IntervalWeatherInfo {
    /// Whether this interval overlaps the half-open range `[start, end)`
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_time < end && self.end_time > start
    }
}

/// A geographical location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}
