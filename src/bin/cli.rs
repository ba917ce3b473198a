//! evlog CLI
//!
//! Command-line interface for inspecting segment directories and files.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use evlog::{segment, Result, SegmentReader};
use serde_json::json;

/// evlog CLI
#[derive(Parser, Debug)]
#[command(name = "evlog-cli")]
#[command(about = "CLI for evlog segment files")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List segments in discovery order
    List {
        /// Segment directory
        dir: PathBuf,
    },

    /// Show the segment a fresh run would open
    Next {
        /// Segment directory
        dir: PathBuf,
    },

    /// Print every row of a segment as a JSON line
    Dump {
        /// Segment file
        file: PathBuf,
    },
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args.command) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::List { dir } => {
            for params in segment::list(&dir)? {
                println!("{}\t{}", params.file_name(), params);
            }
        }
        Commands::Next { dir } => {
            let params = segment::next(&dir)?;
            println!("{}", params.path().display());
        }
        Commands::Dump { file } => {
            let mut reader = SegmentReader::open(&file)?;
            while let Some(row) = reader.next_row()? {
                let data = row.decoded_data().unwrap_or_else(|_| json!(row.data));
                let line = json!({
                    "series": row.series,
                    "session": row.session,
                    "part": row.part,
                    "type": row.kind,
                    "data": data,
                    "time": row.time().map(|t| t.to_rfc3339()),
                    "t_fact": row.fact_time().map(|t| t.to_rfc3339()),
                });
                println!("{}", line);
            }
            if reader.has_corrupted_tail() {
                eprintln!("warning: stopped at corrupt tail (offset {})", reader.offset());
            }
        }
    }
    Ok(())
}
