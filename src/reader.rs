//! Line pump from a GDB output stream to parsed records
//!
//! Each stream gets its own reader and parser. A malformed line is logged
//! and forwarded like any other; it never stops the loop.

use crate::config::ReaderConfig;
use crate::mi::{MiParser, MiRecord};
use anyhow::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Reads MI records line by line from `R`
pub struct MiReader<R> {
    reader: R,
    parser: MiParser,
    skip_prompts: bool,
    buf: Vec<u8>,
    lines_read: usize,
}

impl<R: AsyncBufRead + Unpin> MiReader<R> {
    pub fn new(reader: R, config: &ReaderConfig) -> Self {
        Self {
            reader,
            parser: MiParser::new(&config.charset),
            skip_prompts: config.skip_prompts,
            buf: Vec::new(),
            lines_read: 0,
        }
    }

    /// Number of lines consumed so far, including skipped ones
    pub fn lines_read(&self) -> usize {
        self.lines_read
    }

    /// Next record, or `None` at end of stream. Blank lines are skipped,
    /// and so are prompts when configured.
    pub async fn next_record(&mut self) -> Result<Option<MiRecord>> {
        loop {
            self.buf.clear();
            if self.reader.read_until(b'\n', &mut self.buf).await? == 0 {
                return Ok(None);
            }
            self.lines_read += 1;

            // GDB may echo target output that is not valid UTF-8
            let line = String::from_utf8_lossy(&self.buf);
            if line.trim().is_empty() {
                continue;
            }
            debug!("GDB output: {}", line.trim_end());

            let record = self.parser.parse_line(&line);
            if let Some(err) = record.syntax_error() {
                warn!("Malformed MI line: {} - {}", line.trim_end(), err);
            }
            if self.skip_prompts && record.is_prompt() {
                continue;
            }
            return Ok(Some(record));
        }
    }

    /// Forwards every record to `tx` until end of stream or until the
    /// receiver goes away. Returns the number of lines read.
    pub async fn pump(mut self, tx: mpsc::Sender<MiRecord>) -> Result<usize> {
        while let Some(record) = self.next_record().await? {
            if tx.send(record).await.is_err() {
                info!("Record receiver dropped, stopping reader");
                break;
            }
        }
        info!("MI reader stopped after {} lines", self.lines_read);
        Ok(self.lines_read)
    }
}

/// Runs a reader for `reader` on its own task
pub fn spawn_reader<R>(
    reader: R,
    config: &ReaderConfig,
) -> (mpsc::Receiver<MiRecord>, JoinHandle<Result<usize>>)
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    let mi_reader = MiReader::new(reader, config);
    let handle = tokio::spawn(mi_reader.pump(tx));
    (rx, handle)
}
