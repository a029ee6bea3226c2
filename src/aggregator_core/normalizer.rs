//! Input event normalization from capture rows to categorized events

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;

/// Layout used by the capture log for event timestamps (always UTC)
pub const CAPTURE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Input categories charted by the activity views
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventCategory {
    KeyPress,
    Right,
    Left,
    Middle,
}

impl EventCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventCategory::KeyPress => "KeyPress",
            EventCategory::Right => "Right",
            EventCategory::Left => "Left",
            EventCategory::Middle => "Middle",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "KeyPress" => Some(EventCategory::KeyPress),
            "Right" => Some(EventCategory::Right),
            "Left" => Some(EventCategory::Left),
            "Middle" => Some(EventCategory::Middle),
            _ => None,
        }
    }

    pub fn all() -> [EventCategory; 4] {
        [
            EventCategory::KeyPress,
            EventCategory::Right,
            EventCategory::Left,
            EventCategory::Middle,
        ]
    }
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A captured event as stored, before its type is checked against the
/// configured categories.
///
/// The store may hold types that are never charted (the capture tool also
/// records `MouseMove`), so `event_type` stays a plain string here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(with = "capture_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
}

impl RawEvent {
    pub fn new(timestamp: DateTime<Utc>, category: EventCategory) -> Self {
        Self {
            timestamp,
            event_type: category.as_str().to_string(),
        }
    }

    /// Parse a RawEvent from a capture JSONL line
    pub fn from_jsonl(line: &str) -> Result<Self, Box<dyn Error>> {
        let event: RawEvent = serde_json::from_str(line)?;
        Ok(event)
    }

    /// Category of this event, if it is one of the known input categories
    pub fn category(&self) -> Option<EventCategory> {
        EventCategory::from_str(&self.event_type)
    }
}

pub fn parse_capture_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, CAPTURE_TIMESTAMP_FORMAT) {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

pub fn format_capture_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(CAPTURE_TIMESTAMP_FORMAT).to_string()
}

/// Serde adapter: writes RFC 3339, reads either the capture layout or RFC 3339
mod capture_timestamp {
    use super::parse_capture_timestamp;
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_capture_timestamp(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_capture_jsonl() {
        let line = r#"{"uuid":"5b0c7a52-0d54-4f51-9a55-3f6f1f0d2d11","timestamp":"2024-05-01 10:00:02","event_type":"KeyPress","details":0.0}"#;

        let event = RawEvent::from_jsonl(line).unwrap();
        assert_eq!(event.timestamp, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 2).unwrap());
        assert_eq!(event.event_type, "KeyPress");
        assert_eq!(event.category(), Some(EventCategory::KeyPress));
    }

    #[test]
    fn test_parse_rfc3339_jsonl() {
        let line = r#"{"timestamp":"2024-05-01T10:00:02+02:00","event_type":"Left"}"#;

        let event = RawEvent::from_jsonl(line).unwrap();
        assert_eq!(event.timestamp, Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 2).unwrap());
        assert_eq!(event.category(), Some(EventCategory::Left));
    }

    #[test]
    fn test_mouse_move_has_no_category() {
        let line = r#"{"timestamp":"2024-05-01 10:00:02","event_type":"MouseMove","details":1.000500}"#;

        let event = RawEvent::from_jsonl(line).unwrap();
        assert_eq!(event.category(), None);
    }

    #[test]
    fn test_malformed_jsonl() {
        assert!(
            RawEvent::from_jsonl(r#"{"timestamp": "yesterday", "event_type": "Left"}"#).is_err()
        );
        assert!(RawEvent::from_jsonl(r#"{"invalid": "json"#).is_err());
    }

    #[test]
    fn test_category_names_round_trip() {
        for category in EventCategory::all() {
            assert_eq!(EventCategory::from_str(category.as_str()), Some(category));
        }
        assert_eq!(EventCategory::from_str("keypress"), None);
    }

    #[test]
    fn test_capture_timestamp_format() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 23, 59, 59).unwrap();
        assert_eq!(format_capture_timestamp(&ts), "2024-05-01 23:59:59");
        assert_eq!(parse_capture_timestamp("2024-05-01 23:59:59"), Some(ts));
    }
}
