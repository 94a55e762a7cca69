//! Scalar settings persisted next to the cached feed, one store key each.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    app::errors::{FeedError, FeedResult},
    storage::{read_json, write_json, StorageManager},
};

pub const KEY_CHANNELS: &str = "channels";
pub const KEY_VIDEOS: &str = "videos";
pub const KEY_LAST_FETCH: &str = "lastFetchTimestamp";
pub const KEY_PER_CHANNEL_COUNT: &str = "perChannelItemCount";
pub const KEY_RETENTION_MONTHS: &str = "retentionMonths";
pub const KEY_API_KEY: &str = "apiKey";
pub const KEY_VIEW_MODE: &str = "viewMode";
pub const KEY_HIDE_SHORTS: &str = "hideShorts";
pub const KEY_HIDE_WATCHED: &str = "hideWatched";
pub const KEY_FILTER_TERMS: &str = "filterTerms";
pub const KEY_CURRENT_PAGE: &str = "currentPage";

pub const PER_CHANNEL_COUNT_RANGE: std::ops::RangeInclusive<u32> = 1..=50;
pub const RETENTION_MONTHS_RANGE: std::ops::RangeInclusive<u32> = 1..=9;

const DEFAULT_PER_CHANNEL_COUNT: u32 = 3;
const DEFAULT_RETENTION_MONTHS: u32 = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    List,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub last_fetch_timestamp: Option<i64>,
    pub per_channel_item_count: u32,
    pub retention_months: u32,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub view_mode: ViewMode,
    pub hide_shorts: bool,
    pub hide_watched: bool,
    pub filter_terms: String,
    pub current_page: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            last_fetch_timestamp: None,
            per_channel_item_count: DEFAULT_PER_CHANNEL_COUNT,
            retention_months: DEFAULT_RETENTION_MONTHS,
            api_key: String::new(),
            view_mode: ViewMode::default(),
            hide_shorts: false,
            hide_watched: false,
            filter_terms: String::new(),
            current_page: 1,
        }
    }
}

impl Settings {
    /// Reads every scalar, using defaults for absent, malformed or
    /// out-of-range values.
    pub fn load(store: &dyn StorageManager) -> Self {
        let defaults = Self::default();

        Self {
            last_fetch_timestamp: read_json::<i64>(store, KEY_LAST_FETCH),
            per_channel_item_count: read_json::<u32>(store, KEY_PER_CHANNEL_COUNT)
                .filter(|value| PER_CHANNEL_COUNT_RANGE.contains(value))
                .unwrap_or(defaults.per_channel_item_count),
            retention_months: read_json::<u32>(store, KEY_RETENTION_MONTHS)
                .filter(|value| RETENTION_MONTHS_RANGE.contains(value))
                .unwrap_or(defaults.retention_months),
            api_key: read_json(store, KEY_API_KEY).unwrap_or(defaults.api_key),
            view_mode: read_json(store, KEY_VIEW_MODE).unwrap_or(defaults.view_mode),
            hide_shorts: read_json(store, KEY_HIDE_SHORTS).unwrap_or(defaults.hide_shorts),
            hide_watched: read_json(store, KEY_HIDE_WATCHED).unwrap_or(defaults.hide_watched),
            filter_terms: read_json(store, KEY_FILTER_TERMS).unwrap_or(defaults.filter_terms),
            current_page: read_json::<usize>(store, KEY_CURRENT_PAGE)
                .filter(|page| *page >= 1)
                .unwrap_or(defaults.current_page),
        }
    }

    pub fn last_fetch(&self) -> Option<DateTime<Utc>> {
        self.last_fetch_timestamp
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
    }
}

pub fn write_last_fetch(store: &dyn StorageManager, at: DateTime<Utc>) -> FeedResult<()> {
    write_json(store, KEY_LAST_FETCH, &at.timestamp_millis())
}

/// Parses a bounded integer setting typed by the user.
pub fn parse_bounded(
    field: &str,
    raw: &str,
    range: &std::ops::RangeInclusive<u32>,
) -> FeedResult<u32> {
    let value = raw
        .trim()
        .parse::<u32>()
        .map_err(|_| FeedError::validation(field, format!("{raw:?} is not a whole number")))?;

    if !range.contains(&value) {
        return Err(FeedError::validation(
            field,
            format!("{value} is outside {}..={}", range.start(), range.end()),
        ));
    }

    Ok(value)
}

/// Writes a bounded setting, or leaves the stored value alone when `raw` is
/// malformed or out of range. Returns whether the value was written.
pub fn write_bounded(
    store: &dyn StorageManager,
    key: &str,
    raw: &str,
    range: &std::ops::RangeInclusive<u32>,
) -> FeedResult<bool> {
    match parse_bounded(key, raw, range) {
        Ok(value) => {
            write_json(store, key, &value)?;
            Ok(true)
        }
        Err(err) => {
            log::warn!("ignoring setting change: {err}");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::BackendMemory;

    #[test]
    fn defaults_when_store_is_empty() {
        let store = BackendMemory::new();
        let settings = Settings::load(&store);
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.per_channel_item_count, 3);
        assert_eq!(settings.last_fetch(), None);
    }

    #[test]
    fn out_of_range_writes_are_ignored() {
        let store = BackendMemory::new();

        assert!(write_bounded(&store, KEY_PER_CHANNEL_COUNT, "10", &PER_CHANNEL_COUNT_RANGE).unwrap());
        assert!(!write_bounded(&store, KEY_PER_CHANNEL_COUNT, "51", &PER_CHANNEL_COUNT_RANGE).unwrap());
        assert!(!write_bounded(&store, KEY_PER_CHANNEL_COUNT, "0", &PER_CHANNEL_COUNT_RANGE).unwrap());
        assert!(!write_bounded(&store, KEY_PER_CHANNEL_COUNT, "ten", &PER_CHANNEL_COUNT_RANGE).unwrap());
        assert_eq!(Settings::load(&store).per_channel_item_count, 10);

        assert!(!write_bounded(&store, KEY_RETENTION_MONTHS, "12", &RETENTION_MONTHS_RANGE).unwrap());
        assert_eq!(Settings::load(&store).retention_months, 3);
    }

    #[test]
    fn parse_bounded_reports_validation_errors() {
        let err = parse_bounded("retentionMonths", "x", &RETENTION_MONTHS_RANGE).unwrap_err();
        assert!(matches!(err, FeedError::Validation { .. }));
        assert_eq!(parse_bounded("retentionMonths", " 9 ", &RETENTION_MONTHS_RANGE).unwrap(), 9);
    }

    #[test]
    fn out_of_range_stored_values_fall_back_to_default() {
        let store = BackendMemory::new();
        write_json(&store, KEY_RETENTION_MONTHS, &40u32).unwrap();
        assert_eq!(Settings::load(&store).retention_months, 3);
    }

    #[test]
    fn last_fetch_is_epoch_millis() {
        let store = BackendMemory::new();
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        write_last_fetch(&store, at).unwrap();

        let raw: i64 = read_json(&store, KEY_LAST_FETCH).unwrap();
        assert_eq!(raw, at.timestamp_millis());
        assert_eq!(Settings::load(&store).last_fetch(), Some(at));
    }
}
