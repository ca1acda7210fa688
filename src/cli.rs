use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Backend;

#[derive(Parser)]
#[command(name = "scanlog")]
#[command(about = "Scan QR codes and keep a location-tagged history")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Config file (defaults to ~/.config/scanlog/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Storage backend for the history log
    #[arg(long, value_enum, global = true)]
    pub store: Option<Backend>,

    /// Directory holding the history store
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Deny location access for this run
    #[arg(long, global = true, default_value_t = false)]
    pub no_location: bool,

    /// Show debug logging
    #[arg(long, short = 'v', global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Read decode events from stdin, one payload per line
    Scan,

    /// Decode and save a single payload
    Record(RecordArgs),

    /// Show the saved history
    History(HistoryArgs),

    /// Import a code from an image file
    Import(ImportArgs),
}

#[derive(Parser)]
pub struct RecordArgs {
    /// Code payload to save
    pub payload: String,
}

#[derive(Parser)]
pub struct HistoryArgs {
    /// Output as JSON instead of table
    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Parser)]
pub struct ImportArgs {
    /// Image to decode
    pub path: PathBuf,
}
