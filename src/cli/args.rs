//! Command-line argument definitions using clap

use clap::Parser;
use std::path::PathBuf;

/// aqpipe - Train and evaluate a classifier described by a config file
#[derive(Parser, Debug)]
#[command(name = "aqpipe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Pipeline config file (YAML, or JSON when the extension is .json)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Target column name. Overrides data_loader.target_column.
    #[arg(short, long)]
    pub target: Option<String>,

    /// Write a JSON run report (config, split shapes, metrics, timings) to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Log filter for stderr (e.g. "info", "aqpipe=debug").
    /// RUST_LOG takes precedence when set.
    #[arg(long, default_value = "warn")]
    pub log_level: String,

    /// Suppress the banner, step output and result tables
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}
