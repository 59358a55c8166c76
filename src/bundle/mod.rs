//! Bundle orchestration.
//!
//! # Module Structure
//!
//! ```text
//! bundle/
//! ├── compiler   # stylesheet compiler registry (+ built-ins)
//! ├── concat     # fragment concatenation with map folding
//! ├── error      # per-bundle and aggregate error types
//! ├── manifest   # blake3 fingerprints and bundles.json
//! ├── script     # script bundle builder (oxc)
//! ├── style      # style bundle builder (lightningcss)
//! └── mod.rs     # orchestrator and pipeline entry (this file)
//! ```
//!
//! Bundles of one resource kind are independent and build in parallel;
//! the kind's manifest is written only after every bundle has finished,
//! and never when any of them failed — a manifest advertising checksums
//! for bundles that weren't produced would poison cache busting
//! downstream.

pub mod compiler;
pub mod concat;
pub mod error;
pub mod manifest;
pub mod script;
pub mod style;

pub use compiler::CompilerRegistry;
pub use error::{BundleError, BundleFailures, FailedBundle};

use rayon::prelude::*;
use std::fs;
use std::path::PathBuf;

use crate::config::{BundleConfig, BundleMap};
use crate::utils::path::fs_path;
use crate::{debug, log};
use manifest::Manifest;

/// The two kinds of resources the pipeline bundles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Script,
    Style,
}

impl ResourceKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Script => "script",
            Self::Style => "style",
        }
    }

    /// Extension of emitted bundle files.
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Script => ".js",
            Self::Style => ".css",
        }
    }

    fn bundles(self, config: &BundleConfig) -> &BundleMap {
        match self {
            Self::Script => &config.scripts,
            Self::Style => &config.styles,
        }
    }

    fn bundle_dir(self, config: &BundleConfig) -> &str {
        match self {
            Self::Script => config.paths.script_bundles(),
            Self::Style => config.paths.style_bundles(),
        }
    }
}

/// Everything one bundle build needs; derived fresh per invocation.
#[derive(Debug, Clone)]
pub struct BundleJob {
    /// Filesystem prefix logical paths resolve under
    pub webroot: PathBuf,
    /// Logical output path of the minified bundle
    pub output: String,
    /// Resolved logical source paths, in declaration order
    pub sources: Vec<String>,
}

/// Run the whole pipeline: resolve the configuration, bundle scripts,
/// then styles, and return the resolved configuration.
///
/// Takes the raw (unresolved) configuration; see
/// [`BundleConfig::resolve`] for the single-application contract.
pub fn bundle(config: BundleConfig, registry: &CompilerRegistry) -> anyhow::Result<BundleConfig> {
    let config = config.resolve();
    run_kind(&config, registry, ResourceKind::Script)?;
    run_kind(&config, registry, ResourceKind::Style)?;
    Ok(config)
}

/// Build every declared bundle of one kind and write its manifest.
///
/// Bundles run in parallel; a single failure fails the whole kind and
/// suppresses the manifest. The aggregate error names every failed
/// bundle with its cause.
pub fn run_kind(
    config: &BundleConfig,
    registry: &CompilerRegistry,
    kind: ResourceKind,
) -> anyhow::Result<()> {
    let bundles = kind.bundles(config);

    let results: Vec<(String, Result<String, BundleError>)> = bundles
        .par_iter()
        .map(|(name, sources)| (name.clone(), build_one(config, registry, kind, name, sources)))
        .collect();

    let mut checksums = Manifest::new();
    let mut failures = Vec::new();
    for (name, result) in results {
        match result {
            Ok(checksum) => {
                checksums.insert(name, checksum);
            }
            Err(error) => failures.push(FailedBundle { name, error }),
        }
    }

    if !failures.is_empty() {
        return Err(BundleFailures {
            kind: kind.label(),
            failures,
        }
        .into());
    }

    let manifest_dir = fs_path(&config.webroot, kind.bundle_dir(config));
    fs::create_dir_all(&manifest_dir)
        .map_err(|err| BundleError::Io(manifest_dir.clone(), err))?;
    manifest::write(&manifest_dir, &checksums)?;
    log!("bundle"; "{} manifest: {} bundle(s)", kind.label(), checksums.len());

    Ok(())
}

/// Build one bundle and fingerprint the emitted file.
fn build_one(
    config: &BundleConfig,
    registry: &CompilerRegistry,
    kind: ResourceKind,
    name: &str,
    sources: &[String],
) -> Result<String, BundleError> {
    let output = format!("{}{}{}", kind.bundle_dir(config), name, kind.extension());
    let full = fs_path(&config.webroot, &output);

    if let Some(parent) = full.parent() {
        fs::create_dir_all(parent).map_err(|err| BundleError::Io(parent.to_path_buf(), err))?;
    }

    let job = BundleJob {
        webroot: config.webroot.clone(),
        output: output.clone(),
        sources: sources.to_vec(),
    };

    match kind {
        ResourceKind::Script => script::build(&job)?,
        ResourceKind::Style => style::build(&job, registry)?,
    }

    let checksum = manifest::checksum_file(&full)?;
    debug!("bundle"; "{} {} ({})", kind.label(), output, &checksum[..8]);
    Ok(checksum)
}

// ============================================================================
// tests
// ============================================================================
