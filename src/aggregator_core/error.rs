//! Errors raised by window construction and interval aggregation

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationError {
    /// Window bounds or bucket width cannot produce a bucket grid
    InvalidWindow(String),
    /// No categories were configured
    EmptyCategories,
    /// An in-window event carried a category outside the configured set
    UnknownCategory {
        event_type: String,
        timestamp: DateTime<Utc>,
    },
}

impl std::fmt::Display for AggregationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregationError::InvalidWindow(msg) => write!(f, "Invalid window: {}", msg),
            AggregationError::EmptyCategories => write!(f, "Category set cannot be empty"),
            AggregationError::UnknownCategory {
                event_type,
                timestamp,
            } => write!(
                f,
                "Unknown event category '{}' at {}",
                event_type,
                timestamp.to_rfc3339()
            ),
        }
    }
}

impl std::error::Error for AggregationError {}
