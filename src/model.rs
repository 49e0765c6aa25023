use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One gallery photo. Only the metadata lives here; the image itself stays at `url`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    /// Generated by the store, never supplied by clients
    pub id: Uuid,

    /// Absolute URL of the image
    pub url: String,

    pub title: String,

    /// `None` when the client left it out or sent an empty string
    pub description: Option<String>,

    /// Free-form calendar date, kept exactly as the client sent it
    pub date: String,

    pub location: Option<String>,

    /// When this record entered the store
    pub created_at: DateTime<Utc>,
}

/// Create input that already passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPhoto {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub date: String,
    pub location: Option<String>,
}

impl NewPhoto {
    pub fn new(url: impl Into<String>, title: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
            description: None,
            date: date.into(),
            location: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub(crate) fn into_photo(self, id: Uuid, created_at: DateTime<Utc>) -> Photo {
        Photo {
            id,
            url: self.url,
            title: self.title,
            description: non_empty(self.description),
            date: self.date,
            location: non_empty(self.location),
            created_at,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.is_empty())
}

/// Sort position derived from a photo's `date` string.
///
/// Parseable dates compare by instant. Anything else ranks below every parseable
/// date and falls back to comparing the raw text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DateKey {
    Unparsed(String),
    Instant(i64),
}

impl DateKey {
    pub fn from_date(raw: &str) -> Self {
        match parse_instant(raw.trim()) {
            Some(ts) => DateKey::Instant(ts),
            None => DateKey::Unparsed(raw.to_string()),
        }
    }
}

// Milliseconds since the epoch, UTC
fn parse_instant(raw: &str) -> Option<i64> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.timestamp_millis());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc().timestamp_millis());
        }
    }
    parse_partial(raw)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

// ISO partial dates: "2024-07" is the first of the month, "2024" the first of the year
fn parse_partial(raw: &str) -> Option<NaiveDate> {
    let digits = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());

    match raw.split_once('-') {
        Some((year, month)) if digits(year, 4) && digits(month, 2) => {
            NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, 1)
        }
        None if digits(raw, 4) => NaiveDate::from_ymd_opt(raw.parse().ok()?, 1, 1),
        _ => None,
    }
}
