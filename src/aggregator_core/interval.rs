//! Interval aggregation: per-bucket event counts per category
//!
//! Each call builds a fresh bucket grid from its window, assigns every
//! in-window event to exactly one bucket, and flags buckets that start after
//! the reference instant as incomplete. Nothing is carried between calls.

use super::error::AggregationError;
use super::normalizer::{EventCategory, RawEvent};
use super::window::WindowSpec;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Non-empty set of categories every bucket reports on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySet {
    categories: Vec<EventCategory>,
}

impl CategorySet {
    pub fn new(
        categories: impl IntoIterator<Item = EventCategory>,
    ) -> Result<Self, AggregationError> {
        let mut categories: Vec<EventCategory> = categories.into_iter().collect();
        categories.sort();
        categories.dedup();

        if categories.is_empty() {
            return Err(AggregationError::EmptyCategories);
        }

        Ok(Self { categories })
    }

    /// All input categories the capture tool charts
    pub fn all() -> Self {
        Self {
            categories: EventCategory::all().to_vec(),
        }
    }

    pub fn contains(&self, category: EventCategory) -> bool {
        self.categories.binary_search(&category).is_ok()
    }

    pub fn iter(&self) -> impl Iterator<Item = EventCategory> + '_ {
        self.categories.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Count per category, holding an entry for every configured category
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CategoryCounts(BTreeMap<EventCategory, u64>);

impl CategoryCounts {
    pub fn zeroed(categories: &CategorySet) -> Self {
        Self(categories.iter().map(|c| (c, 0)).collect())
    }

    /// Count for `category`; 0 for categories outside the set
    pub fn get(&self, category: EventCategory) -> u64 {
        self.0.get(&category).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EventCategory, u64)> + '_ {
        self.0.iter().map(|(c, n)| (*c, *n))
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    fn increment(&mut self, category: EventCategory) {
        if let Some(count) = self.0.get_mut(&category) {
            *count += 1;
        }
    }

    fn add(&mut self, other: &CategoryCounts) {
        for (category, count) in other.iter() {
            if let Some(total) = self.0.get_mut(&category) {
                *total += count;
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bucket {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub counts: CategoryCounts,
    /// Events skipped in lenient mode because their category is not configured
    pub unrecognized: u64,
    /// `start <= reference`; incomplete buckets still carry their raw counts
    pub complete: bool,
}

/// What to do with an in-window event whose category is not configured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownCategoryPolicy {
    /// Fail the whole aggregation
    #[default]
    Strict,
    /// Skip the event, counting it in the bucket's `unrecognized` tally
    Lenient,
}

impl UnknownCategoryPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnknownCategoryPolicy::Strict => "strict",
            UnknownCategoryPolicy::Lenient => "lenient",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "strict" => Some(UnknownCategoryPolicy::Strict),
            "lenient" => Some(UnknownCategoryPolicy::Lenient),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    /// Chronological, exactly `window.bucket_count()` long
    pub buckets: Vec<Bucket>,
    /// Sum over complete buckets only
    pub totals: CategoryCounts,
    pub valid_as_of: DateTime<Utc>,
    pub unrecognized_total: u64,
}

impl Aggregation {
    /// Per-bucket counts for one category, `None` where the bucket is incomplete
    pub fn series(&self, category: EventCategory) -> Vec<Option<u64>> {
        self.buckets
            .iter()
            .map(|b| b.complete.then(|| b.counts.get(category)))
            .collect()
    }

    pub fn complete_buckets(&self) -> usize {
        self.buckets.iter().filter(|b| b.complete).count()
    }
}

#[derive(Debug, Clone)]
pub struct IntervalAggregator {
    categories: CategorySet,
    policy: UnknownCategoryPolicy,
}

impl IntervalAggregator {
    pub fn new(categories: CategorySet) -> Self {
        Self {
            categories,
            policy: UnknownCategoryPolicy::default(),
        }
    }

    pub fn with_policy(categories: CategorySet, policy: UnknownCategoryPolicy) -> Self {
        Self { categories, policy }
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    pub fn policy(&self) -> UnknownCategoryPolicy {
        self.policy
    }

    /// Bucket `events` over `window` as seen at `reference`.
    ///
    /// Events outside `[window.start, window.coverage_end())` are ignored
    /// regardless of their category. Input order does not matter.
    pub fn aggregate<'a, I>(
        &self,
        window: &WindowSpec,
        events: I,
        reference: DateTime<Utc>,
    ) -> Result<Aggregation, AggregationError>
    where
        I: IntoIterator<Item = &'a RawEvent>,
    {
        let width = window.bucket_width();
        let mut buckets: Vec<Bucket> = (0..window.bucket_count())
            .map(|i| {
                let start = window.bucket_start(i);
                Bucket {
                    start,
                    end: start + width,
                    counts: CategoryCounts::zeroed(&self.categories),
                    unrecognized: 0,
                    complete: start <= reference,
                }
            })
            .collect();

        let mut unrecognized_total = 0;
        for event in events {
            let Some(index) = window.index_of(event.timestamp) else {
                continue;
            };

            match event.category().filter(|c| self.categories.contains(*c)) {
                Some(category) => buckets[index].counts.increment(category),
                None => match self.policy {
                    UnknownCategoryPolicy::Strict => {
                        return Err(AggregationError::UnknownCategory {
                            event_type: event.event_type.clone(),
                            timestamp: event.timestamp,
                        });
                    }
                    UnknownCategoryPolicy::Lenient => {
                        log::debug!(
                            "Skipping '{}' event at {}: category not configured",
                            event.event_type,
                            event.timestamp
                        );
                        buckets[index].unrecognized += 1;
                        unrecognized_total += 1;
                    }
                },
            }
        }

        let mut totals = CategoryCounts::zeroed(&self.categories);
        for bucket in buckets.iter().filter(|b| b.complete) {
            totals.add(&bucket.counts);
        }

        Ok(Aggregation {
            buckets,
            totals,
            valid_as_of: reference,
            unrecognized_total,
        })
    }
}

/// Strict-mode aggregation with an explicit category set
pub fn aggregate<'a, I>(
    window: &WindowSpec,
    categories: &CategorySet,
    events: I,
    reference: DateTime<Utc>,
) -> Result<Aggregation, AggregationError>
where
    I: IntoIterator<Item = &'a RawEvent>,
{
    IntervalAggregator::new(categories.clone()).aggregate(window, events, reference)
}
