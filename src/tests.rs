#[cfg(test)]
mod tests {
    use crate::aggregator_core::{
        aggregate, AggregationError, CategorySet, EventCategory, RawEvent, ViewPreset, WindowSpec,
    };
    use chrono::{Duration, TimeZone, Utc};

    /// Hour view: every in-window event is counted exactly once
    #[test]
    fn test_hour_view_conserves_events() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 18, 0, 0).unwrap();
        let window = ViewPreset::Hour.window_at(now).unwrap();

        let events: Vec<RawEvent> = (0..120)
            .map(|i| {
                let category = EventCategory::all()[i % 4];
                RawEvent::new(now - Duration::seconds(i as i64 * 37), category)
            })
            .collect();

        let result = aggregate(&window, &CategorySet::all(), &events, now).unwrap();
        let in_window = events
            .iter()
            .filter(|e| e.timestamp >= window.start() && e.timestamp < window.coverage_end())
            .count() as u64;

        let counted: u64 = result.buckets.iter().map(|b| b.counts.total()).sum();
        assert_eq!(result.buckets.len(), 12);
        assert_eq!(counted, in_window);
        // The event at exactly `now` sits on the coverage end and is dropped
        assert_eq!(in_window, 97);
        assert_eq!(result.totals.total(), in_window);
    }

    /// Day view: the closing-midnight bucket exists but is never complete
    #[test]
    fn test_day_view_closing_bucket() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 23, 59, 59).unwrap();
        let window = ViewPreset::Day.window_at(now).unwrap();
        let events = vec![
            RawEvent::new(now, EventCategory::Middle),
            RawEvent::new(now + Duration::minutes(1), EventCategory::Middle),
        ];

        let result = aggregate(&window, &CategorySet::all(), &events, now).unwrap();

        assert_eq!(result.buckets.len(), 49);
        assert!(result.buckets[47].complete);
        assert!(!result.buckets[48].complete);
        assert_eq!(result.buckets[48].counts.get(EventCategory::Middle), 1);
        assert_eq!(result.totals.get(EventCategory::Middle), 1);
    }

    #[test]
    fn test_invalid_window_is_fatal() {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let err = WindowSpec::derived(start, start, Duration::minutes(5)).unwrap_err();

        assert!(matches!(err, AggregationError::InvalidWindow(_)));
        assert!(err.to_string().starts_with("Invalid window"));
    }
}
