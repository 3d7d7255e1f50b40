//! Main CLI parser and top-level argument handling.
//!
//! This module defines the root CLI structure with global options.

use std::path::PathBuf;

use clap::Parser;

use crate::commands::Commands;

/// Command-line interface for the modelfetch download server.
///
/// Global options configure folder-class resolution and apply to every
/// subcommand.
#[derive(Parser, Debug)]
#[command(name = "modelfetch")]
#[command(about = "Download model files in the background with live progress")]
#[command(version)]
pub struct Cli {
    /// Root directory holding one subdirectory per folder class
    #[arg(long = "models-dir", env = "MODELFETCH_MODELS_DIR", global = true)]
    pub models_dir: Option<PathBuf>,

    /// Persistent storage root; `<dir>/models/<class>` wins where it exists
    #[arg(long = "persistent-dir", env = "MODELFETCH_PERSISTENT_DIR", global = true)]
    pub persistent_dir: Option<PathBuf>,

    /// Extra folder class, optionally with an explicit directory
    #[arg(long = "folder", value_name = "NAME[=PATH]", global = true)]
    pub folders: Vec<String>,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}
