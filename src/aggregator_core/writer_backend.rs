//! Writer backend trait for chart series snapshots
//!
//! Defines the interface for publishing aggregated series to different backends.

use super::snapshot::SeriesSnapshot;
use async_trait::async_trait;

#[derive(Debug)]
pub enum SeriesWriterError {
    Io(std::io::Error),
    Serialization(serde_json::Error),
    Database(rusqlite::Error),
    UnknownView(String),
}

impl From<std::io::Error> for SeriesWriterError {
    fn from(err: std::io::Error) -> Self {
        SeriesWriterError::Io(err)
    }
}

impl From<serde_json::Error> for SeriesWriterError {
    fn from(err: serde_json::Error) -> Self {
        SeriesWriterError::Serialization(err)
    }
}

impl From<rusqlite::Error> for SeriesWriterError {
    fn from(err: rusqlite::Error) -> Self {
        SeriesWriterError::Database(err)
    }
}

impl std::fmt::Display for SeriesWriterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeriesWriterError::Io(e) => write!(f, "IO error: {}", e),
            SeriesWriterError::Serialization(e) => write!(f, "Serialization error: {}", e),
            SeriesWriterError::Database(e) => write!(f, "Database error: {}", e),
            SeriesWriterError::UnknownView(v) => write!(f, "Unknown view: {}", v),
        }
    }
}

impl std::error::Error for SeriesWriterError {}

/// Backend trait for publishing series snapshots
#[async_trait]
pub trait SeriesWriterBackend: Send {
    /// Publish one snapshot
    async fn write_snapshot(&mut self, snapshot: &SeriesSnapshot) -> Result<(), SeriesWriterError>;

    /// Flush pending writes to storage
    async fn flush(&mut self) -> Result<(), SeriesWriterError>;

    /// Get backend type for logging
    fn backend_type(&self) -> &'static str;
}
