//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Baler asset bundler CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: baler.toml)
    #[arg(short = 'C', long, default_value = "baler.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build every declared script and style bundle
    #[command(visible_alias = "b")]
    Build {
        /// Override the webroot directory from the config file
        #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
        webroot: Option<PathBuf>,

        /// Enable verbose output for debugging
        #[arg(short = 'V', long)]
        verbose: bool,
    },
}
