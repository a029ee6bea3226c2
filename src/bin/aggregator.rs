//! Aggregator Binary - Interval Series Emitter
//!
//! Periodically buckets captured input events into the chart views and
//! publishes one series snapshot per view.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin aggregator -- --backend jsonl
//! ```
//!
//! ## Environment Variables
//!
//! - INPUTFLOW_DB_PATH - Capture store (default: data/inputflow.db)
//! - SERIES_OUTPUT_PATH - JSONL directory or SQLite file for series output
//! - EMISSION_INTERVAL_SECS - How often to emit series (default: 60)
//! - INPUTFLOW_VIEWS - Comma-separated views: 1h, 24h (default: both)
//! - INPUTFLOW_CATEGORIES - Categories to chart (default: KeyPress,Right,Left,Middle)
//! - UNKNOWN_CATEGORY_POLICY - strict or lenient (default: strict)
//! - RUST_LOG - Logging level (optional, default: info)

use chrono::{DateTime, Utc};
use inputflow::aggregator_core::{
    EventSource, IntervalAggregator, SeriesSnapshot, SeriesWriter, SqliteEventReader,
    UnknownCategoryPolicy, ViewPreset,
};
use inputflow::config::AggregatorConfig;
use tokio::time::{interval, Duration};

fn compute_snapshot(
    view: ViewPreset,
    now: DateTime<Utc>,
    reader: &SqliteEventReader,
    aggregator: &IntervalAggregator,
) -> Result<SeriesSnapshot, Box<dyn std::error::Error>> {
    let window = view.window_at(now)?;
    let events = reader.fetch_events(window.start(), window.coverage_end())?;
    let aggregation = aggregator.aggregate(&window, &events, now)?;

    log::debug!(
        "{}: {} events → {} buckets ({} complete)",
        view.as_str(),
        events.len(),
        aggregation.buckets.len(),
        aggregation.complete_buckets()
    );
    if aggregation.unrecognized_total > 0 {
        log::warn!(
            "{}: skipped {} events with unconfigured categories",
            view.as_str(),
            aggregation.unrecognized_total
        );
    }

    Ok(SeriesSnapshot::new(view, &window, &aggregation))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = AggregatorConfig::from_env()?;

    log::info!("🚀 Starting Interval Aggregator");
    log::info!("   Capture store: {}", config.db_path.display());
    log::info!("   Output: {}", config.output_path.display());
    log::info!(
        "   Views: {}",
        config.views.iter().map(|v| v.as_str()).collect::<Vec<_>>().join(", ")
    );
    log::info!(
        "   Categories: {}",
        config.categories.iter().map(|c| c.as_str()).collect::<Vec<_>>().join(", ")
    );
    log::info!("   Unknown category policy: {}", config.unknown_category_policy.as_str());
    log::info!("   Emission interval: {}s", config.emission_interval_secs);

    let reader = SqliteEventReader::new(&config.db_path)?;
    // Strict mode only sees the charted types; lenient mode sees everything
    // so the skipped count is reported
    let reader = match config.unknown_category_policy {
        UnknownCategoryPolicy::Strict => reader.with_categories(config.categories.iter()),
        UnknownCategoryPolicy::Lenient => reader,
    };
    let aggregator =
        IntervalAggregator::with_policy(config.categories.clone(), config.unknown_category_policy);
    let mut writer = SeriesWriter::new(config.backend, config.output_path.clone())?;

    log::info!("📊 Backend: {}", writer.backend_type());

    let mut emission_ticker = interval(Duration::from_secs(config.emission_interval_secs));

    log::info!("✅ Aggregator running");

    loop {
        tokio::select! {
            _ = emission_ticker.tick() => {
                let now = Utc::now();
                let mut emitted = 0;

                for view in &config.views {
                    match compute_snapshot(*view, now, &reader, &aggregator) {
                        Ok(snapshot) => {
                            if let Err(e) = writer.write_snapshot(&snapshot).await {
                                log::error!("Failed to write {} series: {}", view.as_str(), e);
                                continue;
                            }
                            emitted += 1;
                        }
                        Err(e) => log::error!("Failed to aggregate {} view: {}", view.as_str(), e),
                    }
                }

                if let Err(e) = writer.flush().await {
                    log::error!("Failed to flush series: {}", e);
                }

                log::info!("✅ Emitted {} series as of {}", emitted, now.to_rfc3339());
            }

            _ = tokio::signal::ctrl_c() => {
                log::info!("🛑 Shutdown requested");
                break;
            }
        }
    }

    writer.flush().await?;
    Ok(())
}
