//! Baler - an asset bundling pipeline for JavaScript and CSS.
//!
//! Reads a `baler.toml` declaring named bundles of source files, then
//! concatenates, minifies and fingerprints each bundle, emitting source
//! maps alongside and a `bundles.json` checksum manifest per kind.

mod bundle;
mod cli;
mod config;
mod logger;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::BundleConfig;

use bundle::CompilerRegistry;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    match &cli.command {
        Commands::Build { webroot, verbose } => {
            logger::set_verbose(*verbose);

            let config = BundleConfig::load(&cli.config, webroot.as_deref())?;

            // Registration must finish before any run starts; the
            // registry is read-only from here on.
            let registry = CompilerRegistry::with_builtins();

            let config = bundle::bundle(config, &registry)?;
            log!(
                "bundle";
                "done: {} script bundle(s), {} style bundle(s)",
                config.scripts.len(),
                config.styles.len()
            );
            Ok(())
        }
    }
}
