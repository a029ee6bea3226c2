//! Aggregator Core - Interval Bucketing Engine
//!
//! Turns a stream of captured input events (keypresses, left/right/middle
//! clicks) into fixed-width interval counts for the activity charts.
//!
//! # Architecture
//!
//! ```text
//! Capture JSONL → TailReader → SqliteEventWriter → input_events
//!     ↓
//! SqliteEventReader::fetch_events([start, end))
//!     ↓
//! IntervalAggregator::aggregate(window, events, now)
//!     ↓
//! SeriesSnapshot (buckets + totals, incomplete buckets flagged)
//!     ↓
//! SeriesWriter → JSONL or SQLite backend
//! ```
//!
//! The aggregation step is pure: it reads only its arguments and takes the
//! reference instant explicitly, so the same inputs always produce the same
//! output.

pub mod error;
pub mod event_writer;
pub mod interval;
pub mod jsonl_writer;
pub mod normalizer;
pub mod reader;
pub mod snapshot;
pub mod sqlite_reader;
pub mod sqlite_writer;
pub mod window;
pub mod writer;
pub mod writer_backend;

pub use error::AggregationError;
pub use event_writer::SqliteEventWriter;
pub use interval::{
    aggregate, Aggregation, Bucket, CategoryCounts, CategorySet, IntervalAggregator,
    UnknownCategoryPolicy,
};
pub use jsonl_writer::JsonlSeriesWriter;
pub use normalizer::{EventCategory, RawEvent};
pub use reader::TailReader;
pub use snapshot::{BucketSnapshot, SeriesSnapshot};
pub use sqlite_reader::{EventSource, ReaderError, SqliteEventReader};
pub use sqlite_writer::SqliteSeriesWriter;
pub use window::{BucketCount, ViewPreset, WindowSpec};
pub use writer::{BackendType, SeriesWriter};
pub use writer_backend::{SeriesWriterBackend, SeriesWriterError};
