//! Diary entry model

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::weather::IntervalWeatherInfo;

/// Identifier value carried by records that were never persisted.
pub const UNSAVED_ID: i64 = 0;

/// A diary entry filed under a calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiaryEntry {
    /// Storage-assigned identifier, `UNSAVED_ID` until first insert
    pub id: i64,
    /// Short title
    pub title: String,
    /// Markdown body
    pub content: String,
    /// Creation instant
    pub created_at: DateTime<Utc>,
    /// Last edit instant
    pub updated_at: DateTime<Utc>,
    /// Day the entry is filed under (timezone-naive)
    pub entry_date: NaiveDate,
    /// Weather condition text, e.g. "Sunny"
    #[serde(default)]
    pub weather_condition: Option<String>,
    /// Minimum temperature of the day in Celsius
    #[serde(default)]
    pub min_temperature: Option<f64>,
    /// Maximum temperature of the day in Celsius
    #[serde(default)]
    pub max_temperature: Option<f64>,
}

impl DiaryEntry {
    /// Create a new, unsaved entry with both timestamps set to now
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        entry_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: UNSAVED_ID,
            title: title.into(),
            content: content.into(),
            created_at: now,
            updated_at: now,
            entry_date,
            weather_condition: None,
            min_temperature: None,
            max_temperature: None,
        }
    }

    /// Whether storage has assigned this entry an id
    pub const fn is_persisted(&self) -> bool {
        self.id != UNSAVED_ID
    }

    /// Copy of this entry carrying the given id
    #[must_use]
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = id;
        self
    }

    /// Mark the entry as edited now
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Whether any weather field is set
    pub const fn has_weather(&self) -> bool {
        self.weather_condition.is_some()
            || self.min_temperature.is_some()
            || self.max_temperature.is_some()
    }

    /// Fill the weather fields from hourly intervals.
    ///
    /// Uses the lowest minimum, the highest maximum and the most frequent
    /// condition (earliest wins on ties). Returns `false` and leaves the entry
    /// untouched when `intervals` is empty.
    pub fn annotate_weather(&mut self, intervals: &[IntervalWeatherInfo]) -> bool {
        if intervals.is_empty() {
            return false;
        }

        let min = intervals
            .iter()
            .map(|interval| interval.min_temperature)
            .fold(f64::INFINITY, f64::min);
        let max = intervals
            .iter()
            .map(|interval| interval.max_temperature)
            .fold(f64::NEG_INFINITY, f64::max);

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for interval in intervals {
            *counts.entry(interval.condition.as_str()).or_default() += 1;
        }
        let mut condition = intervals[0].condition.as_str();
        for interval in intervals {
            if counts[interval.condition.as_str()] > counts[condition] {
                condition = interval.condition.as_str();
            }
        }

        self.weather_condition = Some(condition.to_string());
        self.min_temperature = Some(min);
        self.max_temperature = Some(max);
        true
    }

    /// Get first line of the content, truncated to `max_len` characters
    #[must_use]
    pub fn content_preview(&self, max_len: usize) -> String {
        self.content
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(max_len)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn interval(condition: &str, min: f64, max: f64) -> IntervalWeatherInfo {
        let start = Utc::now();
        IntervalWeatherInfo {
            start_time: start,
            end_time: start + Duration::hours(1),
            min_temperature: min,
            max_temperature: max,
            condition: condition.to_string(),
            humidity: 50,
            wind_speed: 5.0,
            icon_url: None,
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    #[test]
    fn test_new_entry_is_unsaved() {
        let entry = DiaryEntry::new("Morning run", "5km, crisp air", day());
        assert_eq!(entry.id, UNSAVED_ID);
        assert!(!entry.is_persisted());
        assert_eq!(entry.created_at, entry.updated_at);
        assert!(!entry.has_weather());
    }

    #[test]
    fn test_touch_moves_updated_at_forward() {
        let mut entry = DiaryEntry::new("Work", "notes", day());
        let before = entry.updated_at;
        entry.touch();
        assert!(entry.updated_at >= before);
        assert!(entry.updated_at >= entry.created_at);
    }

    #[test]
    fn test_annotate_weather_takes_extremes_and_dominant_condition() {
        let mut entry = DiaryEntry::new("Trip", "", day());
        let annotated = entry.annotate_weather(&[
            interval("Cloudy", 8.0, 9.0),
            interval("Sunny", 11.0, 14.5),
            interval("Sunny", 10.0, 13.0),
            interval("Rain", 6.5, 7.0),
        ]);

        assert!(annotated);
        assert_eq!(entry.weather_condition.as_deref(), Some("Sunny"));
        assert_eq!(entry.min_temperature, Some(6.5));
        assert_eq!(entry.max_temperature, Some(14.5));
    }

    #[test]
    fn test_annotate_weather_tie_prefers_first_condition() {
        let mut entry = DiaryEntry::new("Trip", "", day());
        entry.annotate_weather(&[interval("Cloudy", 1.0, 2.0), interval("Sunny", 1.0, 2.0)]);
        assert_eq!(entry.weather_condition.as_deref(), Some("Cloudy"));
    }

    #[test]
    fn test_annotate_weather_without_intervals_is_noop() {
        let mut entry = DiaryEntry::new("Trip", "", day());
        assert!(!entry.annotate_weather(&[]));
        assert!(!entry.has_weather());
    }

    #[test]
    fn test_content_preview() {
        let entry = DiaryEntry::new("t", "First line\nSecond line", day());
        assert_eq!(entry.content_preview(50), "First line");
        assert_eq!(entry.content_preview(5), "First");
    }
}
