//! Sessionize - fold ordered access logs into completed client sessions.
//!
//! Main entry point for the sessionize CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use sessionize_core::SessionTracker;

mod config;
mod reader;
mod writer;

/// Fold a time-ordered access log into completed client sessions.
///
/// Reads a headered CSV log (ip, date, time, ...), groups consecutive
/// requests per client into sessions bounded by the configured inactivity
/// period, and writes one CSV row per closed session.
#[derive(Parser)]
#[command(name = "sessionize")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the raw access log
    pub log_path: PathBuf,

    /// Path to a text file holding the inactivity period in seconds,
    /// as a single integer
    pub inactivity_path: PathBuf,

    /// Path for the sessionization output
    pub output_path: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "sessionize=debug,sessionize_core=debug,info"
    } else {
        "sessionize=info,sessionize_core=info,warn"
    };

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    run(&cli)
}

/// Drive the tracker: fold each event as it is read, streaming closed
/// sessions to the output, then flush whatever is still open at
/// end-of-stream.
fn run(cli: &Cli) -> Result<()> {
    let inactivity_period = config::read_inactivity_period(&cli.inactivity_path)?;
    let mut tracker = SessionTracker::new(inactivity_period)?;

    let events = reader::EventReader::open(&cli.log_path)?;
    let mut sink = writer::SessionWriter::create(&cli.output_path)?;

    let mut folded: u64 = 0;
    let mut written: u64 = 0;

    for event in events {
        let event = event?;
        for session in tracker.fold(event) {
            sink.write_session(&session)?;
            written += 1;
        }
        folded += 1;
    }

    for session in tracker.flush() {
        sink.write_session(&session)?;
        written += 1;
    }
    sink.flush()?;

    info!(
        events = folded,
        sessions = written,
        "sessionization complete"
    );
    Ok(())
}
