//! JSONL writer for series snapshots - one file per chart view

use super::snapshot::SeriesSnapshot;
use super::window::ViewPreset;
use super::writer_backend::{SeriesWriterBackend, SeriesWriterError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

pub struct JsonlSeriesWriter {
    writers: HashMap<ViewPreset, BufWriter<std::fs::File>>,
    last_flush: Instant,
}

impl JsonlSeriesWriter {
    pub fn new(base_path: PathBuf) -> std::io::Result<Self> {
        std::fs::create_dir_all(&base_path)?;

        let mut writers = HashMap::new();
        for view in ViewPreset::all() {
            let file_path = base_path.join(format!("{}.jsonl", view.as_str()));

            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&file_path)?;

            log::info!("📝 Writing {} series to: {}", view.as_str(), file_path.display());
            writers.insert(view, BufWriter::new(file));
        }

        Ok(Self {
            writers,
            last_flush: Instant::now(),
        })
    }

    pub fn write_snapshot(&mut self, snapshot: &SeriesSnapshot) -> Result<(), SeriesWriterError> {
        let view = ViewPreset::from_str(&snapshot.view)
            .ok_or_else(|| SeriesWriterError::UnknownView(snapshot.view.clone()))?;

        let writer = self
            .writers
            .get_mut(&view)
            .ok_or_else(|| SeriesWriterError::UnknownView(snapshot.view.clone()))?;

        writeln!(writer, "{}", snapshot.to_jsonl()?)?;

        if self.last_flush.elapsed() > Duration::from_secs(5) {
            self.flush()?;
        }

        Ok(())
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        for writer in self.writers.values_mut() {
            writer.flush()?;
        }
        self.last_flush = Instant::now();
        Ok(())
    }
}

impl Drop for JsonlSeriesWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[async_trait]
impl SeriesWriterBackend for JsonlSeriesWriter {
    async fn write_snapshot(&mut self, snapshot: &SeriesSnapshot) -> Result<(), SeriesWriterError> {
        JsonlSeriesWriter::write_snapshot(self, snapshot)
    }

    async fn flush(&mut self) -> Result<(), SeriesWriterError> {
        JsonlSeriesWriter::flush(self)?;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "JSONL"
    }
}
