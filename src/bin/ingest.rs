//! Ingest Binary - Capture Stream Importer
//!
//! Tails the capture tool's JSONL stream and stores each input event in the
//! SQLite capture store read by the aggregator.
//!
//! ## Usage
//!
//! ```bash
//! INPUT_EVENTS_PATH=logs/input_log.jsonl cargo run --release --bin ingest
//! ```
//!
//! ## Environment Variables
//!
//! - INPUT_EVENTS_PATH - Capture JSONL stream (required)
//! - INPUTFLOW_DB_PATH - Capture store (default: data/inputflow.db)
//! - INGEST_REPLAY - Import existing lines before following (default: false)
//! - RUST_LOG - Logging level (optional, default: info)

use inputflow::aggregator_core::{RawEvent, SqliteEventWriter, TailReader};
use inputflow::config::IngestConfig;
use tokio::time::{interval, Duration};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = IngestConfig::from_env()?;

    log::info!("🚀 Starting capture ingestion");
    log::info!("   Capture stream: {}", config.events_path.display());
    log::info!("   Capture store: {}", config.db_path.display());
    log::info!("   Replay existing lines: {}", config.replay);

    let mut reader = TailReader::new(config.events_path.clone());
    if config.replay {
        reader = reader.from_start();
    }
    reader.start().await?;

    let mut writer = SqliteEventWriter::new(&config.db_path)?;
    let mut flush_ticker = interval(Duration::from_secs(2));
    let mut ingested: u64 = 0;
    let mut rejected: u64 = 0;

    loop {
        tokio::select! {
            line_result = reader.read_line() => {
                match line_result {
                    Ok(Some(line)) => match RawEvent::from_jsonl(&line) {
                        Ok(event) => {
                            ingested += 1;
                            // A failed flush keeps the batch; the next tick retries it
                            if let Err(e) = writer.write(event) {
                                log::error!(
                                    "Failed to store input events ({} pending): {}",
                                    writer.pending(),
                                    e
                                );
                            }
                        }
                        Err(e) => {
                            rejected += 1;
                            log::warn!("Failed to parse capture line ({}): {}", e, line);
                        }
                    },
                    Ok(None) => {}
                    Err(e) => {
                        log::error!("Capture stream error: {}", e);
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                }
            }

            _ = flush_ticker.tick() => {
                if writer.pending() > 0 {
                    match writer.flush() {
                        Ok(()) => {
                            log::debug!("💾 {} events ingested, {} rejected", ingested, rejected)
                        }
                        Err(e) => {
                            log::error!("Failed to flush {} input events: {}", writer.pending(), e)
                        }
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                log::info!("🛑 Shutdown requested");
                break;
            }
        }
    }

    writer.flush()?;
    log::info!("✅ Ingested {} events ({} rejected)", ingested, rejected);
    Ok(())
}
