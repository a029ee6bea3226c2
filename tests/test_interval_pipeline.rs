//! Integration tests for the capture → aggregation → series flow
//!
//! Tests verify that events stored by the ingester come back out of the
//! SQLite event source and produce the expected chart series.

#[cfg(test)]
mod interval_pipeline_tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use inputflow::aggregator_core::{
        AggregationError, BackendType, CategorySet, EventCategory, EventSource, IntervalAggregator,
        RawEvent, SeriesSnapshot, SeriesWriter, SqliteEventReader, SqliteEventWriter,
        UnknownCategoryPolicy, ViewPreset,
    };
    use tempfile::tempdir;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, m, s).unwrap()
    }

    fn store(db_path: &std::path::Path, events: &[RawEvent]) {
        let mut writer = SqliteEventWriter::new(db_path).unwrap();
        for event in events {
            writer.write(event.clone()).unwrap();
        }
        writer.flush().unwrap();
    }

    fn raw(ts: DateTime<Utc>, event_type: &str) -> RawEvent {
        RawEvent {
            timestamp: ts,
            event_type: event_type.to_string(),
        }
    }

    #[test]
    fn test_hour_view_from_store() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("inputflow.db");
        store(
            &db_path,
            &[
                RawEvent::new(at(0, 59, 59), EventCategory::Right),
                RawEvent::new(at(0, 2, 0), EventCategory::KeyPress),
                RawEvent::new(at(0, 7, 0), EventCategory::Left),
                RawEvent::new(at(1, 0, 0), EventCategory::Left),
                RawEvent::new(at(0, 0, 0) - Duration::seconds(1), EventCategory::Left),
            ],
        );

        let now = at(1, 0, 0);
        let window = ViewPreset::Hour.window_at(now).unwrap();
        let reader = SqliteEventReader::new(&db_path).unwrap();
        let events = reader.fetch_events(window.start(), window.coverage_end()).unwrap();
        let result = IntervalAggregator::new(CategorySet::all())
            .aggregate(&window, &events, now)
            .unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(result.buckets.len(), 12);
        assert_eq!(result.buckets[0].counts.get(EventCategory::KeyPress), 1);
        assert_eq!(result.buckets[1].counts.get(EventCategory::Left), 1);
        assert_eq!(result.buckets[11].counts.get(EventCategory::Right), 1);
        assert_eq!(result.totals.total(), 3);
    }

    #[test]
    fn test_mouse_moves_in_store() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("inputflow.db");
        store(
            &db_path,
            &[
                RawEvent::new(at(0, 10, 0), EventCategory::KeyPress),
                raw(at(0, 11, 0), "MouseMove"),
                raw(at(0, 12, 0), "MouseMove"),
            ],
        );

        let now = at(1, 0, 0);
        let window = ViewPreset::Hour.window_at(now).unwrap();

        // Unfiltered source + strict aggregation fails the whole call
        let reader = SqliteEventReader::new(&db_path).unwrap();
        let events = reader.fetch_events(window.start(), window.coverage_end()).unwrap();
        let strict = IntervalAggregator::new(CategorySet::all()).aggregate(&window, &events, now);
        assert!(matches!(strict, Err(AggregationError::UnknownCategory { .. })));

        // Lenient aggregation reports the skipped rows
        let lenient =
            IntervalAggregator::with_policy(CategorySet::all(), UnknownCategoryPolicy::Lenient)
                .aggregate(&window, &events, now)
                .unwrap();
        assert_eq!(lenient.unrecognized_total, 2);
        assert_eq!(lenient.totals.total(), 1);

        // Filtered source never hands the aggregator uncharted rows
        let filtered = SqliteEventReader::new(&db_path)
            .unwrap()
            .with_categories(EventCategory::all());
        let events = filtered.fetch_events(window.start(), window.coverage_end()).unwrap();
        let result = IntervalAggregator::new(CategorySet::all())
            .aggregate(&window, &events, now)
            .unwrap();
        assert_eq!(result.totals.total(), 1);
    }

    #[tokio::test]
    async fn test_day_series_written_as_jsonl() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("inputflow.db");
        store(
            &db_path,
            &[
                RawEvent::new(at(8, 15, 0), EventCategory::KeyPress),
                RawEvent::new(at(8, 20, 0), EventCategory::KeyPress),
                RawEvent::new(at(11, 59, 59), EventCategory::Middle),
            ],
        );

        let now = at(12, 0, 0);
        let window = ViewPreset::Day.window_at(now).unwrap();
        let reader = SqliteEventReader::new(&db_path).unwrap();
        let events = reader.fetch_events(window.start(), window.coverage_end()).unwrap();
        let aggregation = IntervalAggregator::new(CategorySet::all())
            .aggregate(&window, &events, now)
            .unwrap();
        let snapshot = SeriesSnapshot::new(ViewPreset::Day, &window, &aggregation);

        let output_dir = dir.path().join("series");
        let mut writer = SeriesWriter::new(BackendType::Jsonl, output_dir.clone()).unwrap();
        writer.write_snapshot(&snapshot).await.unwrap();
        writer.flush().await.unwrap();

        let content = std::fs::read_to_string(output_dir.join("24h.jsonl")).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(content.lines().next().unwrap()).unwrap();
        let buckets = value["buckets"].as_array().unwrap();

        assert_eq!(buckets.len(), 49);
        assert_eq!(buckets[16]["counts"]["KeyPress"], 2);
        assert_eq!(buckets[23]["counts"]["Middle"], 1);
        assert_eq!(buckets[24]["complete"], true);
        assert_eq!(buckets[25]["complete"], false);
        assert_eq!(value["totals"]["KeyPress"], 2);
        assert_eq!(value["totals"]["Middle"], 1);
    }
}
