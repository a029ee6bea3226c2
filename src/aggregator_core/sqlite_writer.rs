//! SQLite writer for series snapshots
//!
//! `interval_counts` holds only the latest series per view: each snapshot
//! replaces every row of its view, so a chart is one `WHERE view = ?` away.

use super::snapshot::SeriesSnapshot;
use super::writer_backend::{SeriesWriterBackend, SeriesWriterError};
use crate::sqlite_pragma::apply_optimized_pragmas;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::path::Path;

pub struct SqliteSeriesWriter {
    conn: Connection,
}

impl SqliteSeriesWriter {
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self, SeriesWriterError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(db_path)?;
        apply_optimized_pragmas(&conn)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS interval_counts (
                view TEXT NOT NULL,
                bucket_start INTEGER NOT NULL,
                bucket_end INTEGER NOT NULL,
                category TEXT NOT NULL,
                count INTEGER NOT NULL,
                complete INTEGER NOT NULL,
                valid_as_of INTEGER NOT NULL,
                PRIMARY KEY (view, bucket_start, category)
            )",
            [],
        )?;

        log::info!("✅ SQLite series writer initialized");

        Ok(Self { conn })
    }

    pub fn write_snapshot(&mut self, snapshot: &SeriesSnapshot) -> Result<(), SeriesWriterError> {
        let valid_as_of = snapshot.valid_as_of.timestamp_millis();

        let tx = self.conn.transaction()?;
        let replaced = tx.execute(
            "DELETE FROM interval_counts WHERE view = ?1",
            params![snapshot.view],
        )?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO interval_counts
                    (view, bucket_start, bucket_end, category, count, complete, valid_as_of)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?;

            for bucket in &snapshot.buckets {
                for (category, count) in bucket.counts.iter() {
                    stmt.execute(params![
                        snapshot.view,
                        bucket.start.timestamp_millis(),
                        bucket.end.timestamp_millis(),
                        category.as_str(),
                        count as i64,
                        bucket.complete,
                        valid_as_of,
                    ])?;
                }
            }
        }
        tx.commit()?;

        log::debug!(
            "✅ Series written: view={} buckets={} replaced_rows={} as_of={}",
            snapshot.view,
            snapshot.buckets.len(),
            replaced,
            snapshot.valid_as_of.to_rfc3339()
        );

        Ok(())
    }
}

#[async_trait]
impl SeriesWriterBackend for SqliteSeriesWriter {
    async fn write_snapshot(&mut self, snapshot: &SeriesSnapshot) -> Result<(), SeriesWriterError> {
        SqliteSeriesWriter::write_snapshot(self, snapshot)
    }

    // Each snapshot commits its own transaction
    async fn flush(&mut self) -> Result<(), SeriesWriterError> {
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "SQLite"
    }
}
