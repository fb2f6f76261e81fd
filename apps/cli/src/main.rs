//! imgprep CLI - materializes labeled image datasets into record containers
//!
//! This CLI provides an `imgprep` command that turns the output of the fetch
//! stage (a manifest plus a row file) into a single binary container of
//! normalized feature records for training.

mod commands;
mod config;

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{inspect, prep};

/// imgprep - dataset materialization for image classification
#[derive(Parser, Debug)]
#[command(
    name = "imgprep",
    author,
    version,
    about = "imgprep - materialize labeled image datasets into record containers",
    long_about = "imgprep reads the manifest and row file produced by the fetch stage, decodes and resizes every image,\nand writes normalized feature records into a single binary container. Bad rows are reported and skipped."
)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Configuration file (overrides ~/.imgprep/config.toml and ./.imgpreprc)
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Materialize the dataset into a record container
    ///
    /// Loads `fetch.json` from the output path, streams its row file, encodes
    /// every image and writes `images.records` plus a JSON summary to the
    /// target directory.
    Prep {
        /// Directory holding the asset folder named in the manifest
        #[arg(short = 'd', long, value_name = "DIR")]
        data_path: Option<PathBuf>,

        /// Directory holding the fetch stage output (fetch.json and the row file)
        #[arg(short = 'o', long, value_name = "DIR")]
        output_path: Option<PathBuf>,

        /// Directory receiving the container and summary
        #[arg(short = 't', long, value_name = "DIR")]
        target_output: Option<PathBuf>,

        /// Edge length of the resized square images
        #[arg(long)]
        image_size: Option<u32>,

        /// Number of rows to encode concurrently (output order is preserved)
        #[arg(short = 'j', long)]
        jobs: Option<usize>,

        /// Output the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect a record container
    ///
    /// Scans the container sequentially and reports the record count, label
    /// distribution and a preview of the first records.
    Inspect {
        /// Path to the container file
        container: PathBuf,

        /// Number of records to preview
        #[arg(long, default_value_t = 5)]
        limit: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_level(level: &str) -> Level {
    match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let prep_config = config::load_config(args.config.as_deref())?;

    // Initialize tracing. Logs go to stderr so `--json` output stays parseable.
    let level = args.log_level.as_deref().or(prep_config.log_level.as_deref()).map_or(Level::INFO, parse_level);
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .without_time()
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // If no command provided, show help
    let command = if let Some(cmd) = args.command {
        cmd
    } else {
        Args::command().print_help()?;
        return Ok(());
    };

    match command {
        Command::Prep { data_path, output_path, target_output, image_size, jobs, json } => {
            let prep_args = prep::PrepArgs { data_path, output_path, target_output, image_size, jobs, json };
            prep::execute(prep_args, &prep_config).await?;
        }
        Command::Inspect { container, limit, json } => {
            inspect::execute(&container, limit, json)?;
        }
    }

    Ok(())
}
