//! Bundle configuration for `baler.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `webroot`   | Filesystem prefix all logical paths resolve under |
//! | `[paths]`   | Logical source/output directories                |
//! | `[scripts]` | Bundle name → ordered script source filenames    |
//! | `[styles]`  | Bundle name → ordered stylesheet source filenames |
//!
//! The loaded [`BundleConfig`] is the pipeline's API surface. A raw config
//! must pass through [`BundleConfig::resolve`] exactly once before any
//! bundling runs: resolution normalizes the directory layout and rewrites
//! every declared source filename into a full logical path. Resolving an
//! already-resolved config prefixes the sources a second time.

mod error;
pub mod paths;

pub use error::ConfigError;
pub use paths::PathsConfig;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::log;
use crate::utils::path::normalize_path;

/// Ordered source lists keyed by bundle name.
///
/// `BTreeMap` keeps bundle iteration (and manifest content) deterministic
/// across runs; the source lists themselves preserve declaration order.
pub type BundleMap = BTreeMap<String, Vec<String>>;

/// Root configuration structure representing `baler.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Filesystem directory under which all logical paths resolve
    #[serde(default)]
    pub webroot: PathBuf,

    /// Logical directory layout
    #[serde(default)]
    pub paths: PathsConfig,

    /// Script bundles: name → ordered list of source filenames
    #[serde(default)]
    pub scripts: BundleMap,

    /// Style bundles: name → ordered list of source filenames
    #[serde(default)]
    pub styles: BundleMap,
}

impl BundleConfig {
    /// Load configuration from a `baler.toml` file.
    ///
    /// `webroot` overrides the file's own webroot when given, and can
    /// supply one the file omits. A relative webroot from the file is
    /// resolved against the config file's parent directory. Unknown
    /// fields are reported but not fatal.
    pub fn load(path: &Path, webroot: Option<&Path>) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (mut config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            let display_path = path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_else(|| path.to_string_lossy());
            log!("warning"; "ignoring unknown fields in {}:", display_path);
            for field in &ignored {
                log!("warning"; "- {}", field);
            }
        }

        config.config_path = normalize_path(path);
        if let Some(webroot) = webroot {
            config.webroot = normalize_path(webroot);
        } else if !config.webroot.as_os_str().is_empty() && config.webroot.is_relative() {
            let base = config.config_path.parent().unwrap_or(Path::new("."));
            config.webroot = normalize_path(&base.join(&config.webroot));
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Validate the raw configuration shape.
    ///
    /// Collects problems that would only surface as confusing bundle
    /// failures later: an unset webroot, empty bundle names, bundles with
    /// no sources.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.webroot.as_os_str().is_empty() {
            return Err(ConfigError::Validation("webroot is not set".into()));
        }

        for (table, bundles) in [("scripts", &self.scripts), ("styles", &self.styles)] {
            for (name, sources) in bundles {
                if name.is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "[{table}] contains a bundle with an empty name"
                    )));
                }
                if sources.is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "[{table}] bundle `{name}` declares no sources"
                    )));
                }
                if sources.iter().any(String::is_empty) {
                    return Err(ConfigError::Validation(format!(
                        "[{table}] bundle `{name}` declares an empty source filename"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Resolve a raw configuration into its normalized form.
    ///
    /// Normalizes the directory layout, then rewrites every declared
    /// source filename into a full logical path under the source directory
    /// for its kind. Pure: the input is consumed and a new value returned.
    ///
    /// Must be applied exactly once per raw configuration; a second
    /// application prefixes the already-resolved sources again.
    pub fn resolve(mut self) -> Self {
        self.paths = self.paths.normalize();

        let script_source = self.paths.script_source().to_string();
        for sources in self.scripts.values_mut() {
            for source in sources.iter_mut() {
                *source = format!("{script_source}{source}");
            }
        }

        let style_source = self.paths.style_source().to_string();
        for sources in self.styles.values_mut() {
            for source in sources.iter_mut() {
                *source = format!("{style_source}{source}");
            }
        }

        self
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> BundleConfig {
        BundleConfig::from_str(
            r#"
            webroot = "/var/www"

            [scripts]
            app = ["main.js", "util.js"]

            [styles]
            site = ["base.css", "theme.scss"]
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_from_str_invalid_toml() {
        let result = BundleConfig::from_str("[scripts\napp = []");
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_tables_default_empty() {
        let config = BundleConfig::from_str("webroot = \"/srv\"").unwrap();
        assert!(config.scripts.is_empty());
        assert!(config.styles.is_empty());
    }

    #[test]
    fn test_resolve_prefixes_sources() {
        let config = sample_config().resolve();
        assert_eq!(
            config.scripts["app"],
            vec!["/js/src/main.js", "/js/src/util.js"]
        );
        assert_eq!(
            config.styles["site"],
            vec!["/css/src/base.css", "/css/src/theme.scss"]
        );
    }

    #[test]
    fn test_resolve_preserves_declaration_order() {
        let config = BundleConfig::from_str(
            r#"
            webroot = "/srv"
            [scripts]
            app = ["z.js", "a.js", "m.js"]
            "#,
        )
        .unwrap()
        .resolve();
        assert_eq!(
            config.scripts["app"],
            vec!["/js/src/z.js", "/js/src/a.js", "/js/src/m.js"]
        );
    }

    #[test]
    fn test_resolve_custom_paths() {
        let config = BundleConfig::from_str(
            r#"
            webroot = "/srv"
            [paths]
            script_source = "assets/scripts"
            [scripts]
            app = ["main.js"]
            "#,
        )
        .unwrap()
        .resolve();
        assert_eq!(config.paths.script_source(), "/assets/scripts/");
        assert_eq!(config.scripts["app"], vec!["/assets/scripts/main.js"]);
    }

    #[test]
    fn test_double_resolve_double_prefixes() {
        // Resolution is single-application by contract; applying it twice
        // is detectable by the repeated source-directory prefix.
        let config = sample_config().resolve().resolve();
        assert_eq!(config.scripts["app"][0], "/js/src//js/src/main.js");
    }

    #[test]
    fn test_validate_requires_webroot() {
        let config = BundleConfig::from_str("[scripts]\napp = [\"a.js\"]").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_rejects_empty_bundle() {
        let config = BundleConfig::from_str(
            r#"
            webroot = "/srv"
            [styles]
            empty = []
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "webroot = \"/srv\"\n[unknown_section]\nfield = \"value\"";
        let (config, ignored) = BundleConfig::parse_with_ignored(content).unwrap();
        assert_eq!(config.webroot, PathBuf::from("/srv"));
        assert!(ignored.iter().any(|f| f.contains("unknown_section")));
    }

    #[test]
    fn test_no_unknown_fields() {
        let content = "webroot = \"/srv\"\n[scripts]\napp = [\"a.js\"]";
        let (_, ignored) = BundleConfig::parse_with_ignored(content).unwrap();
        assert!(ignored.is_empty());
    }

    #[test]
    fn test_load_resolves_relative_webroot() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("baler.toml");
        std::fs::write(&config_path, "webroot = \"site\"").unwrap();
        std::fs::create_dir_all(dir.path().join("site")).unwrap();

        let config = BundleConfig::load(&config_path, None).unwrap();
        assert!(config.webroot.is_absolute());
        assert!(config.webroot.ends_with("site"));
    }

    #[test]
    fn test_load_without_webroot_fails_validation() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("baler.toml");
        std::fs::write(&config_path, "[scripts]\napp = [\"a.js\"]").unwrap();

        let err = BundleConfig::load(&config_path, None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_webroot_override_supplies_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("baler.toml");
        std::fs::write(&config_path, "[scripts]\napp = [\"a.js\"]").unwrap();

        let config = BundleConfig::load(&config_path, Some(dir.path())).unwrap();
        assert_eq!(config.webroot, normalize_path(dir.path()));
    }

    #[test]
    fn test_load_webroot_override_wins_over_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let config_path = dir.path().join("baler.toml");
        std::fs::write(&config_path, "webroot = \"/var/www\"").unwrap();

        let config = BundleConfig::load(&config_path, Some(dir.path())).unwrap();
        assert_eq!(config.webroot, normalize_path(dir.path()));
    }
}
