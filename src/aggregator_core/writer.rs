//! Unified writer interface for series snapshots
//!
//! Routes writes to either JSONL or SQLite backend based on configuration.

use super::jsonl_writer::JsonlSeriesWriter;
use super::snapshot::SeriesSnapshot;
use super::sqlite_writer::SqliteSeriesWriter;
use super::writer_backend::{SeriesWriterBackend, SeriesWriterError};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    Jsonl,
    Sqlite,
}

impl BackendType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "jsonl" => Some(BackendType::Jsonl),
            "sqlite" => Some(BackendType::Sqlite),
            _ => None,
        }
    }
}

/// Unified writer that routes to either JSONL or SQLite backend
pub enum SeriesWriter {
    Jsonl(JsonlSeriesWriter),
    Sqlite(SqliteSeriesWriter),
}

impl SeriesWriter {
    /// `path` is a directory for JSONL and a database file for SQLite
    pub fn new(backend: BackendType, path: PathBuf) -> Result<Self, SeriesWriterError> {
        match backend {
            BackendType::Jsonl => Ok(SeriesWriter::Jsonl(JsonlSeriesWriter::new(path)?)),
            BackendType::Sqlite => Ok(SeriesWriter::Sqlite(SqliteSeriesWriter::new(path)?)),
        }
    }

    pub async fn write_snapshot(
        &mut self,
        snapshot: &SeriesSnapshot,
    ) -> Result<(), SeriesWriterError> {
        self.backend_mut().write_snapshot(snapshot).await
    }

    pub async fn flush(&mut self) -> Result<(), SeriesWriterError> {
        self.backend_mut().flush().await
    }

    pub fn backend_type(&self) -> &'static str {
        match self {
            SeriesWriter::Jsonl(w) => w.backend_type(),
            SeriesWriter::Sqlite(w) => w.backend_type(),
        }
    }

    fn backend_mut(&mut self) -> &mut dyn SeriesWriterBackend {
        match self {
            SeriesWriter::Jsonl(w) => w,
            SeriesWriter::Sqlite(w) => w,
        }
    }
}
