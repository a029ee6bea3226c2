//! Serializable chart series handed to the renderer

use super::interval::{Aggregation, CategoryCounts};
use super::window::{ViewPreset, WindowSpec};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketSnapshot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub counts: CategoryCounts,
    /// Renderers draw incomplete buckets as gaps rather than zeros
    pub complete: bool,
    #[serde(skip_serializing_if = "is_zero")]
    pub unrecognized: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesSnapshot {
    pub view: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub bucket_width_secs: i64,
    pub valid_as_of: DateTime<Utc>,
    pub buckets: Vec<BucketSnapshot>,
    pub totals: CategoryCounts,
    pub unrecognized_total: u64,
}

impl SeriesSnapshot {
    pub fn new(view: ViewPreset, window: &WindowSpec, aggregation: &Aggregation) -> Self {
        Self {
            view: view.as_str().to_string(),
            window_start: window.start(),
            window_end: window.end(),
            bucket_width_secs: window.bucket_width().num_seconds(),
            valid_as_of: aggregation.valid_as_of,
            buckets: aggregation
                .buckets
                .iter()
                .map(|b| BucketSnapshot {
                    start: b.start,
                    end: b.end,
                    counts: b.counts.clone(),
                    complete: b.complete,
                    unrecognized: b.unrecognized,
                })
                .collect(),
            totals: aggregation.totals.clone(),
            unrecognized_total: aggregation.unrecognized_total,
        }
    }

    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}
