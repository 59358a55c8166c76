//! Logical directory layout for bundle sources and outputs.
//!
//! All four directories are webroot-relative logical paths. After
//! [`PathsConfig::normalize`] they are guaranteed to start and end with a
//! `/`, so source filenames and bundle names can be appended directly.

use serde::{Deserialize, Serialize};

use crate::utils::path::enclose_slashes;

/// Default logical directories, matching the conventional webroot layout.
pub const DEFAULT_SCRIPT_SOURCE: &str = "/js/src/";
pub const DEFAULT_SCRIPT_BUNDLES: &str = "/js/bundle/";
pub const DEFAULT_STYLE_SOURCE: &str = "/css/src/";
pub const DEFAULT_STYLE_BUNDLES: &str = "/css/bundle/";

/// The `[paths]` section of `baler.toml`.
///
/// Every field is optional; missing entries fall back to the defaults
/// above during normalization. The accessors return the default until
/// [`PathsConfig::normalize`] has filled the fields in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding script sources
    pub script_source: Option<String>,

    /// Directory receiving minified script bundles
    pub script_bundles: Option<String>,

    /// Directory holding stylesheet sources
    pub style_source: Option<String>,

    /// Directory receiving minified style bundles
    pub style_bundles: Option<String>,
}

impl PathsConfig {
    /// Fill in defaults and force leading/trailing separators.
    ///
    /// Idempotent on the directories themselves; the single-application
    /// contract of config resolution concerns source prefixing, not this.
    pub fn normalize(&self) -> Self {
        Self {
            script_source: normalize_dir(self.script_source.as_deref(), DEFAULT_SCRIPT_SOURCE),
            script_bundles: normalize_dir(self.script_bundles.as_deref(), DEFAULT_SCRIPT_BUNDLES),
            style_source: normalize_dir(self.style_source.as_deref(), DEFAULT_STYLE_SOURCE),
            style_bundles: normalize_dir(self.style_bundles.as_deref(), DEFAULT_STYLE_BUNDLES),
        }
    }

    pub fn script_source(&self) -> &str {
        self.script_source.as_deref().unwrap_or(DEFAULT_SCRIPT_SOURCE)
    }

    pub fn script_bundles(&self) -> &str {
        self.script_bundles.as_deref().unwrap_or(DEFAULT_SCRIPT_BUNDLES)
    }

    pub fn style_source(&self) -> &str {
        self.style_source.as_deref().unwrap_or(DEFAULT_STYLE_SOURCE)
    }

    pub fn style_bundles(&self) -> &str {
        self.style_bundles.as_deref().unwrap_or(DEFAULT_STYLE_BUNDLES)
    }
}

fn normalize_dir(dir: Option<&str>, default: &str) -> Option<String> {
    match dir {
        None | Some("") => Some(default.to_string()),
        Some(dir) => Some(enclose_slashes(dir)),
    }
}
