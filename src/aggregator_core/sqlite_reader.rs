//! SQLite-backed event source for interval aggregation
//!
//! Reads captured input events for a half-open time range from the
//! `input_events` table written by the ingester.

use super::normalizer::{EventCategory, RawEvent};
use crate::sqlite_pragma::apply_optimized_pragmas;
use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::Connection;
use std::path::Path;

#[derive(Debug)]
pub enum ReaderError {
    Database(rusqlite::Error),
    InvalidTimestamp(i64),
}

impl From<rusqlite::Error> for ReaderError {
    fn from(err: rusqlite::Error) -> Self {
        ReaderError::Database(err)
    }
}

impl std::fmt::Display for ReaderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReaderError::Database(e) => write!(f, "Database error: {}", e),
            ReaderError::InvalidTimestamp(ms) => write!(f, "Invalid event timestamp: {}ms", ms),
        }
    }
}

impl std::error::Error for ReaderError {}

/// Supplies events for `[range_start, range_end)`, in no particular order
pub trait EventSource {
    fn fetch_events(
        &self,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>, ReaderError>;
}

/// Read-only reader over the `input_events` table
pub struct SqliteEventReader {
    conn: Connection,
    event_types: Option<Vec<String>>,
}

impl SqliteEventReader {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, ReaderError> {
        let conn = Connection::open(db_path)?;

        apply_optimized_pragmas(&conn)?;

        // Read-only from here on (must be after PRAGMAs)
        conn.execute_batch("PRAGMA query_only = ON")?;

        let rows: i64 = conn.query_row("SELECT COUNT(*) FROM input_events", [], |row| row.get(0))?;
        log::info!("📥 SQLite event reader initialized: {} stored events", rows);

        Ok(Self {
            conn,
            event_types: None,
        })
    }

    /// Restrict fetched rows to the given categories.
    ///
    /// The capture store also holds uncharted types such as `MouseMove`.
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = EventCategory>) -> Self {
        self.event_types = Some(categories.into_iter().map(|c| c.as_str().to_string()).collect());
        self
    }
}

impl EventSource for SqliteEventReader {
    fn fetch_events(
        &self,
        range_start: DateTime<Utc>,
        range_end: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>, ReaderError> {
        let mut params: Vec<Value> = vec![
            Value::Integer(range_start.timestamp_millis()),
            Value::Integer(range_end.timestamp_millis()),
        ];

        let mut sql = String::from(
            "SELECT timestamp, event_type FROM input_events
             WHERE timestamp >= ?1 AND timestamp < ?2",
        );
        if let Some(ref types) = self.event_types {
            let placeholders: Vec<String> =
                (0..types.len()).map(|i| format!("?{}", i + 3)).collect();
            sql.push_str(&format!(" AND event_type IN ({})", placeholders.join(", ")));
            params.extend(types.iter().cloned().map(Value::Text));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params.iter()), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (ms, event_type) = row?;
            let timestamp =
                DateTime::from_timestamp_millis(ms).ok_or(ReaderError::InvalidTimestamp(ms))?;
            events.push(RawEvent {
                timestamp,
                event_type,
            });
        }

        log::debug!(
            "📥 Fetched {} events for [{}, {})",
            events.len(),
            range_start.to_rfc3339(),
            range_end.to_rfc3339()
        );

        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rusqlite::params;
    use tempfile::tempdir;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, s).unwrap()
    }

    fn setup_test_db() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");

        let conn = Connection::open(&db_path).unwrap();
        conn.execute(
            "CREATE TABLE input_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp INTEGER NOT NULL,
                event_type TEXT NOT NULL
            )",
            [],
        )
        .unwrap();

        (dir, db_path)
    }

    fn insert_event(conn: &Connection, ts: DateTime<Utc>, event_type: &str) {
        conn.execute(
            "INSERT INTO input_events (timestamp, event_type) VALUES (?1, ?2)",
            params![ts.timestamp_millis(), event_type],
        )
        .unwrap();
    }

    #[test]
    fn test_fetch_half_open_range() {
        let (_dir, db_path) = setup_test_db();
        let conn = Connection::open(&db_path).unwrap();
        insert_event(&conn, at(0, 0, 0) - Duration::milliseconds(1), "KeyPress");
        insert_event(&conn, at(0, 0, 0), "KeyPress");
        insert_event(&conn, at(0, 30, 0), "Left");
        insert_event(&conn, at(1, 0, 0), "Right");
        drop(conn);

        let reader = SqliteEventReader::new(&db_path).unwrap();
        let mut events = reader.fetch_events(at(0, 0, 0), at(1, 0, 0)).unwrap();
        events.sort_by_key(|e| e.timestamp);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], RawEvent::new(at(0, 0, 0), EventCategory::KeyPress));
        assert_eq!(events[1], RawEvent::new(at(0, 30, 0), EventCategory::Left));
    }

    #[test]
    fn test_category_filter() {
        let (_dir, db_path) = setup_test_db();
        let conn = Connection::open(&db_path).unwrap();
        insert_event(&conn, at(0, 1, 0), "KeyPress");
        insert_event(&conn, at(0, 2, 0), "MouseMove");
        insert_event(&conn, at(0, 3, 0), "Middle");
        drop(conn);

        let unfiltered = SqliteEventReader::new(&db_path).unwrap();
        assert_eq!(unfiltered.fetch_events(at(0, 0, 0), at(1, 0, 0)).unwrap().len(), 3);

        let reader = SqliteEventReader::new(&db_path)
            .unwrap()
            .with_categories(EventCategory::all());
        let events = reader.fetch_events(at(0, 0, 0), at(1, 0, 0)).unwrap();

        assert_eq!(events.len(), 2);
        assert!(events.iter().all(|e| e.category().is_some()));
    }

    #[test]
    fn test_read_only_mode() {
        let (_dir, db_path) = setup_test_db();

        let reader = SqliteEventReader::new(&db_path).unwrap();
        let result = reader.conn.execute(
            "INSERT INTO input_events (timestamp, event_type) VALUES (0, 'KeyPress')",
            [],
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_missing_table() {
        let dir = tempdir().unwrap();
        let result = SqliteEventReader::new(dir.path().join("empty.db"));

        assert!(matches!(result, Err(ReaderError::Database(_))));
    }
}
