//! Bundle build error types.
//!
//! Every variant of [`BundleError`] is fatal to the bundle that raised it;
//! nothing is retried. [`BundleFailures`] aggregates the failed bundles of
//! one resource kind so a run reports every broken bundle at once instead
//! of stopping at the first.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A failure while building a single bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("source file not found: `{0}`")]
    SourceNotFound(String),

    #[error("no compiler registered for `{0}` stylesheets")]
    UnsupportedFormat(String),

    #[error("failed to compile `{path}`: {detail}")]
    CompilationFailed { path: String, detail: String },

    #[error("minification failed for `{path}`: {detail}")]
    MinificationFailed { path: String, detail: String },

    #[error("source map handling failed for `{path}`: {detail}")]
    SourceMap { path: String, detail: String },

    #[error("IO error on `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}

impl BundleError {
    /// Classify a read failure: missing files get the dedicated
    /// `SourceNotFound` variant, everything else stays an IO error.
    pub fn from_read(logical: &str, fs_path: PathBuf, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::SourceNotFound(logical.to_string())
        } else {
            Self::Io(fs_path, err)
        }
    }
}

/// One bundle's failure, tagged with the bundle name.
#[derive(Debug)]
pub struct FailedBundle {
    pub name: String,
    pub error: BundleError,
}

/// Aggregate failure for one resource kind.
///
/// Raised by the orchestrator after the parallel join when at least one
/// bundle failed; its presence means no manifest was written for the kind.
#[derive(Debug)]
pub struct BundleFailures {
    pub kind: &'static str,
    pub failures: Vec<FailedBundle>,
}

impl fmt::Display for BundleFailures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} bundle{} failed",
            self.failures.len(),
            self.kind,
            if self.failures.len() == 1 { "" } else { "s" }
        )?;
        for failed in &self.failures {
            write!(f, "\n  {}: {}", failed.name, failed.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for BundleFailures {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_read_missing_file() {
        let err = std::io::Error::from(std::io::ErrorKind::NotFound);
        let classified = BundleError::from_read("/js/src/a.js", PathBuf::from("/www/js/src/a.js"), err);
        assert!(matches!(classified, BundleError::SourceNotFound(p) if p == "/js/src/a.js"));
    }

    #[test]
    fn test_from_read_other_io() {
        let err = std::io::Error::from(std::io::ErrorKind::PermissionDenied);
        let classified = BundleError::from_read("/js/src/a.js", PathBuf::from("/www/js/src/a.js"), err);
        assert!(matches!(classified, BundleError::Io(..)));
    }

    #[test]
    fn test_failures_display_lists_every_bundle() {
        let failures = BundleFailures {
            kind: "style",
            failures: vec![
                FailedBundle {
                    name: "site".into(),
                    error: BundleError::UnsupportedFormat(".less".into()),
                },
                FailedBundle {
                    name: "admin".into(),
                    error: BundleError::SourceNotFound("/css/src/admin.css".into()),
                },
            ],
        };
        let rendered = failures.to_string();
        assert!(rendered.contains("2 style bundles failed"));
        assert!(rendered.contains("site: no compiler registered for `.less` stylesheets"));
        assert!(rendered.contains("admin: source file not found"));
    }
}
