use crate::core::Strategy;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "image_batch")]
#[command(about = "Apply random filters to a batch of images with live progress and cancellation")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Process every image in a directory
    Run {
        /// Directory containing the source images
        directory: PathBuf,

        /// Execution strategy: concurrent or sequential
        #[arg(short, long)]
        strategy: Option<Strategy>,

        /// Artificial delay per transform in milliseconds
        #[arg(short, long)]
        delay_ms: Option<u64>,

        /// Cancel the run after this many milliseconds
        #[arg(long)]
        cancel_after_ms: Option<u64>,

        /// Directory to write processed images and the run summary
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// JSON configuration file (flags override its values)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Downscale images larger than this on load
        #[arg(long)]
        max_dimension: Option<u32>,

        /// Suppress progress output
        #[arg(short, long)]
        quiet: bool,
    },
}
