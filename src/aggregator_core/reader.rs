//! Asynchronous JSONL tail reader for the capture stream, with rotation detection

use std::io::SeekFrom;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncSeekExt, BufReader};
use tokio::time::sleep;

#[cfg(unix)]
use std::os::unix::fs::MetadataExt;

pub struct TailReader {
    path: PathBuf,
    file: Option<BufReader<File>>,
    inode: Option<u64>,
    poll_interval: Duration,
    from_start: bool,
    /// Bytes of a line the writer has not finished yet. Kept on the reader so
    /// a `read_line` dropped by `select!` loses nothing.
    pending: Vec<u8>,
}

impl TailReader {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            file: None,
            inode: None,
            poll_interval: Duration::from_millis(100),
            from_start: false,
            pending: Vec::new(),
        }
    }

    /// Replay lines already in the file before following new ones
    pub fn from_start(mut self) -> Self {
        self.from_start = true;
        self
    }

    /// Open the file; seeks to the end unless `from_start` was requested.
    ///
    /// A rotated file is always read from its beginning.
    pub async fn start(&mut self) -> std::io::Result<()> {
        self.open(!self.from_start).await?;
        log::info!("📖 Started tailing: {}", self.path.display());
        Ok(())
    }

    async fn open(&mut self, seek_end: bool) -> std::io::Result<()> {
        let file = File::open(&self.path).await?;
        let metadata = file.metadata().await?;

        #[cfg(unix)]
        {
            self.inode = Some(metadata.ino());
        }
        #[cfg(not(unix))]
        let _ = metadata;

        let mut reader = BufReader::new(file);
        if seek_end {
            reader.seek(SeekFrom::End(0)).await?;
        }
        self.file = Some(reader);
        self.pending.clear();
        Ok(())
    }

    /// Read the next complete non-empty line, waiting if necessary.
    ///
    /// A line without its trailing newline is held back until the rest of it
    /// has been written.
    pub async fn read_line(&mut self) -> std::io::Result<Option<String>> {
        loop {
            if self.detect_rotation().await? {
                log::info!("🔄 Capture log rotated, reopening: {}", self.path.display());
                self.open(false).await?;
            }

            let Some(ref mut reader) = self.file else {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "File not opened",
                ));
            };

            if reader.read_until(b'\n', &mut self.pending).await? == 0
                || self.pending.last() != Some(&b'\n')
            {
                sleep(self.poll_interval).await;
                continue;
            }

            let line = std::mem::take(&mut self.pending);
            let line = String::from_utf8_lossy(&line);
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
    }

    /// Rotation shows up as a new inode (unix) or a file shorter than our position
    async fn detect_rotation(&mut self) -> std::io::Result<bool> {
        let metadata = match tokio::fs::metadata(&self.path).await {
            Ok(m) => m,
            // Mid-rotation: old file moved away, new one not yet created
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };

        #[cfg(unix)]
        {
            if self.inode.map_or(false, |old| old != metadata.ino()) {
                return Ok(true);
            }
        }

        if let Some(ref mut file) = self.file {
            let position = file.stream_position().await?;
            return Ok(metadata.len() < position);
        }
        Ok(false)
    }
}
