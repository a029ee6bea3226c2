//! Fixed-width bucket grids over a time window

use super::error::AggregationError;
use chrono::{DateTime, Duration, DurationRound, Utc};

/// How many buckets a window is split into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketCount {
    /// `ceil((end - start) / bucket_width)`
    Derived,
    /// Fixed count, may extend the grid past `end`
    Explicit(usize),
}

/// Window definition: `[start, end)` cut into `bucket_width` slices.
///
/// Bucket `i` covers `[start + i*width, start + (i+1)*width)`. When the span is
/// not a multiple of the width the last derived bucket extends past `end` and
/// is kept like any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    bucket_width: Duration,
    width_ns: i64,
    bucket_count: usize,
}

impl WindowSpec {
    pub fn new(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bucket_width: Duration,
        count: BucketCount,
    ) -> Result<Self, AggregationError> {
        if start >= end {
            return Err(AggregationError::InvalidWindow(format!(
                "start {} must be before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }

        if bucket_width <= Duration::zero() {
            return Err(AggregationError::InvalidWindow(format!(
                "bucket width must be positive, got {}",
                bucket_width
            )));
        }
        let width_ns = bucket_width.num_nanoseconds().ok_or_else(|| {
            AggregationError::InvalidWindow(format!("bucket width {} is too large", bucket_width))
        })?;

        let bucket_count = match count {
            BucketCount::Derived => {
                let span_ns = (end - start).num_nanoseconds().ok_or_else(|| {
                    AggregationError::InvalidWindow("window span is too large".to_string())
                })?;
                (span_ns / width_ns + i64::from(span_ns % width_ns != 0)) as usize
            }
            BucketCount::Explicit(0) => {
                return Err(AggregationError::InvalidWindow(
                    "explicit bucket count must be positive".to_string(),
                ));
            }
            BucketCount::Explicit(n) => n,
        };

        let coverage_ns = i64::try_from(bucket_count)
            .ok()
            .and_then(|n| width_ns.checked_mul(n))
            .ok_or_else(|| {
                AggregationError::InvalidWindow(format!(
                    "{} buckets overflow the time range",
                    bucket_count
                ))
            })?;
        if start.checked_add_signed(Duration::nanoseconds(coverage_ns)).is_none() {
            return Err(AggregationError::InvalidWindow(
                "bucket grid extends past the representable time range".to_string(),
            ));
        }

        Ok(Self {
            start,
            end,
            bucket_width,
            width_ns,
            bucket_count,
        })
    }

    /// Window with a bucket count derived from the span
    pub fn derived(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        bucket_width: Duration,
    ) -> Result<Self, AggregationError> {
        Self::new(start, end, bucket_width, BucketCount::Derived)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn bucket_width(&self) -> Duration {
        self.bucket_width
    }

    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    pub fn bucket_start(&self, index: usize) -> DateTime<Utc> {
        self.start + Duration::nanoseconds(self.width_ns * index as i64)
    }

    /// Exclusive upper bound of the grid: `start + N * bucket_width`
    pub fn coverage_end(&self) -> DateTime<Utc> {
        self.bucket_start(self.bucket_count)
    }

    /// Bucket holding `ts`, or `None` when it falls outside the grid.
    ///
    /// Floor division, so a timestamp exactly on a boundary belongs to the
    /// bucket starting there.
    pub fn index_of(&self, ts: DateTime<Utc>) -> Option<usize> {
        if ts < self.start {
            return None;
        }
        // Offsets beyond i64 nanoseconds are past any valid grid
        let offset_ns = (ts - self.start).num_nanoseconds()?;
        let index = (offset_ns / self.width_ns) as usize;
        (index < self.bucket_count).then_some(index)
    }
}

/// Chart views served by the aggregator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewPreset {
    /// Trailing hour in 5-minute buckets
    Hour,
    /// Current UTC day in 30-minute buckets
    Day,
}

impl ViewPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewPreset::Hour => "1h",
            ViewPreset::Day => "24h",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "1h" => Some(ViewPreset::Hour),
            "24h" => Some(ViewPreset::Day),
            _ => None,
        }
    }

    pub fn all() -> [ViewPreset; 2] {
        [ViewPreset::Hour, ViewPreset::Day]
    }

    pub fn bucket_width(&self) -> Duration {
        match self {
            ViewPreset::Hour => Duration::minutes(5),
            ViewPreset::Day => Duration::minutes(30),
        }
    }

    /// Window this view shows at `now`.
    ///
    /// `Hour` is `[now - 1h, now)` with 12 derived buckets. `Day` runs from
    /// UTC midnight to the next midnight with 49 buckets: 48 half hours plus
    /// the bucket opening at the closing midnight, which is always in the
    /// future relative to `now` and so reported incomplete.
    pub fn window_at(&self, now: DateTime<Utc>) -> Result<WindowSpec, AggregationError> {
        match self {
            ViewPreset::Hour => {
                WindowSpec::derived(now - Duration::hours(1), now, self.bucket_width())
            }
            ViewPreset::Day => {
                let midnight = now.duration_trunc(Duration::days(1)).map_err(|e| {
                    AggregationError::InvalidWindow(format!("cannot align day window: {}", e))
                })?;
                WindowSpec::new(
                    midnight,
                    midnight + Duration::days(1),
                    self.bucket_width(),
                    BucketCount::Explicit(49),
                )
            }
        }
    }
}
