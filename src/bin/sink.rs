//! evlog Sink Binary
//!
//! Logs every stdin line into rotated segment files.

use std::io::{self, BufRead};
use std::time::Duration;

use clap::Parser;
use evlog::{stream, Config, Logger};
use serde_json::Value;
use tracing_subscriber::{fmt, EnvFilter};

/// evlog Sink
#[derive(Parser, Debug)]
#[command(name = "evlog-sink")]
#[command(about = "Durable event log sink with time-rotated segments")]
#[command(version)]
struct Args {
    /// Segment directory
    #[arg(short, long, default_value = "./evlog_data")]
    dir: String,

    /// Stream name stamped on every line
    #[arg(short, long, default_value = "stdin")]
    stream: String,

    /// Seconds between segment rotations
    #[arg(short, long, default_value = "3600")]
    rotate_secs: u64,

    /// Buffered lines before stdin reading blocks
    #[arg(short, long, default_value = "100")]
    capacity: usize,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,evlog=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("evlog sink v{}", evlog::VERSION);
    tracing::info!("Segment directory: {}", args.dir);

    // Build config from args
    let config = Config::builder()
        .dirname(&args.dir)
        .rotation_interval(Duration::from_secs(args.rotate_secs))
        .buffer_capacity(args.capacity)
        .build();

    let (producer, source) = stream::bounded::<Value>(args.stream.clone(), config.buffer_capacity);
    let logger = Logger::new(config, [(args.stream.clone(), source)]);

    if let Err(e) = logger.start() {
        tracing::error!("Failed to start logger: {}", e);
        std::process::exit(1);
    }

    // Lines that parse as JSON are logged as such, anything else as a string
    for line in io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("Failed to read stdin: {}", e);
                break;
            }
        };
        let value = serde_json::from_str(&line).unwrap_or(Value::String(line));
        if let Err(e) = producer.push(value) {
            tracing::error!("Failed to push line: {}", e);
            break;
        }
    }

    // EOF: closing the only stream lets the writer drain and close
    drop(producer);

    match logger.join() {
        Ok(stats) => tracing::info!(
            "Wrote {} entries ({} dropped, {} rotations)",
            stats.entries_written,
            stats.entries_dropped,
            stats.rotations
        ),
        Err(e) => {
            tracing::error!("Logger error: {}", e);
            std::process::exit(1);
        }
    }
}
