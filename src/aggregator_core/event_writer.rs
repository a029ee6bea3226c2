//! Batched SQLite writer for captured input events

use super::normalizer::RawEvent;
use crate::sqlite_pragma::apply_optimized_pragmas;
use rusqlite::{params, Connection};
use std::path::Path;
use std::time::{Duration, Instant};

pub struct SqliteEventWriter {
    conn: Connection,
    batch: Vec<RawEvent>,
    batch_size: usize,
    last_flush: Instant,
    flush_interval: Duration,
}

impl SqliteEventWriter {
    pub fn new(db_path: impl AsRef<Path>) -> rusqlite::Result<Self> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    log::error!("Failed to create database directory {}: {}", parent.display(), e);
                    rusqlite::Error::InvalidPath(parent.to_path_buf())
                })?;
            }
        }

        let conn = Connection::open(db_path)?;
        apply_optimized_pragmas(&conn)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS input_events (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp INTEGER NOT NULL,
                event_type TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_input_events_timestamp ON input_events(timestamp)",
            [],
        )?;

        log::info!("✅ SQLite event store initialized with WAL mode");

        Ok(Self {
            conn,
            batch: Vec::with_capacity(100),
            batch_size: 100,
            last_flush: Instant::now(),
            flush_interval: Duration::from_secs(2),
        })
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Queue an event, flushing when the batch is full or stale.
    ///
    /// The event stays queued when the flush fails.
    pub fn write(&mut self, event: RawEvent) -> rusqlite::Result<()> {
        self.batch.push(event);

        if self.batch.len() >= self.batch_size || self.last_flush.elapsed() >= self.flush_interval {
            self.flush()?;
        }

        Ok(())
    }

    /// Commit the batch in one transaction; on error the batch is kept for the next call
    pub fn flush(&mut self) -> rusqlite::Result<()> {
        if self.batch.is_empty() {
            self.last_flush = Instant::now();
            return Ok(());
        }

        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO input_events (timestamp, event_type) VALUES (?1, ?2)",
            )?;
            for event in &self.batch {
                stmt.execute(params![event.timestamp.timestamp_millis(), event.event_type])?;
            }
        }
        tx.commit()?;

        log::debug!("💾 Flushed {} input events", self.batch.len());
        self.batch.clear();
        self.last_flush = Instant::now();
        Ok(())
    }

    pub fn pending(&self) -> usize {
        self.batch.len()
    }
}

impl Drop for SqliteEventWriter {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            log::error!("Failed to flush input events on shutdown: {}", e);
        }
    }
}
