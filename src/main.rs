//! GDB/MI record dumper
//!
//! Reads GDB/MI output on stdin and prints one JSON object per record on
//! stdout, e.g.
//!
//! ```text
//! gdb --interpreter=mi2 ./a.out | gdb-mi
//! GDB_MI_CHARSET=Cp1251 gdb-mi < session.log
//! ```

use anyhow::Result;
use gdb_mi::config::ReaderConfig;
use gdb_mi::reader::spawn_reader;
use std::io::Write;
use tokio::io::BufReader;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ReaderConfig::from_env();
    info!(
        "Starting gdb-mi v{} (charset {})",
        env!("CARGO_PKG_VERSION"),
        config.charset
    );

    let (mut records, reader) = spawn_reader(BufReader::new(tokio::io::stdin()), &config);

    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();
    let mut count = 0usize;

    while let Some(record) = records.recv().await {
        let json = serde_json::to_string(&record)?;
        debug!("Sending: {}", json);
        writeln!(stdout, "{}", json)?;
        stdout.flush()?;
        count += 1;
    }

    let lines = reader.await??;
    info!("Read {} lines, emitted {} records", lines, count);
    Ok(())
}
