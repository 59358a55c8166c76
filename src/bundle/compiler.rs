//! Pluggable stylesheet compilers, keyed by file extension.
//!
//! A compiler turns one style source file into minifiable CSS plus an
//! optional source map. The registry is an explicit value populated
//! before a run starts and read-only while bundles build, so concurrent
//! bundle tasks can share it by reference.
//!
//! Built-ins: `.css` sources are read verbatim; `.scss`/`.sass` sources
//! are handed to the external `sass` executable.

use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::error::BundleError;
use crate::utils::path::fs_path;

/// Compiler output: minifiable CSS and an optional source map (JSON)
/// mapping the code back to the compiler's own input.
#[derive(Debug, Clone)]
pub struct Compiled {
    pub code: String,
    pub map: Option<String>,
}

impl Compiled {
    /// A verbatim fragment with no map of its own.
    pub fn verbatim(code: String) -> Self {
        Self { code, map: None }
    }
}

/// One stylesheet compiler, invoked once per style source file.
pub trait StyleCompiler: Send + Sync {
    fn compile(&self, webroot: &Path, source: &str) -> Result<Compiled, BundleError>;
}

impl<F> StyleCompiler for F
where
    F: Fn(&Path, &str) -> Result<Compiled, BundleError> + Send + Sync,
{
    fn compile(&self, webroot: &Path, source: &str) -> Result<Compiled, BundleError> {
        self(webroot, source)
    }
}

/// Extension → compiler mapping.
pub struct CompilerRegistry {
    compilers: FxHashMap<String, Box<dyn StyleCompiler>>,
}

impl CompilerRegistry {
    /// An empty registry with no compilers at all.
    pub fn new() -> Self {
        Self {
            compilers: FxHashMap::default(),
        }
    }

    /// The default registry: `.css` verbatim, `.scss`/`.sass` via the
    /// external `sass` executable (resolved from PATH once, here).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(".css", read_verbatim);

        let sass = SassCompiler::discover();
        registry.register(".scss", sass.clone());
        registry.register(".sass", sass);
        registry
    }

    /// Register a compiler for an extension (leading dot optional).
    pub fn register(&mut self, extension: &str, compiler: impl StyleCompiler + 'static) {
        self.compilers
            .insert(dotted(extension), Box::new(compiler));
    }

    /// Look up the compiler for an extension.
    ///
    /// An unregistered extension is a hard error; the caller must abort
    /// the whole bundle rather than skip the file.
    pub fn lookup(&self, extension: &str) -> Result<&dyn StyleCompiler, BundleError> {
        let key = dotted(extension);
        self.compilers
            .get(&key)
            .map(Box::as_ref)
            .ok_or(BundleError::UnsupportedFormat(key))
    }
}

impl Default for CompilerRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

fn dotted(extension: &str) -> String {
    if extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{extension}")
    }
}

/// Built-in `.css` compiler: the file's own bytes, no map.
fn read_verbatim(webroot: &Path, source: &str) -> Result<Compiled, BundleError> {
    let path = fs_path(webroot, source);
    let code =
        fs::read_to_string(&path).map_err(|err| BundleError::from_read(source, path, err))?;
    Ok(Compiled::verbatim(code))
}

// ============================================================================
// sass
// ============================================================================

/// Built-in `.scss`/`.sass` compiler backed by the `sass` executable.
///
/// Compiles into a scratch directory with the dialect extension swapped
/// for `.css`, strips the inline `sourceMappingURL` reference, and
/// rewrites the emitted map's sources to the logical input path.
#[derive(Clone)]
pub struct SassCompiler {
    program: Option<PathBuf>,
}

impl SassCompiler {
    /// Resolve the `sass` executable from PATH.
    pub fn discover() -> Self {
        Self {
            program: which::which("sass").ok(),
        }
    }

    #[cfg(test)]
    fn with_program(program: Option<PathBuf>) -> Self {
        Self { program }
    }
}

impl StyleCompiler for SassCompiler {
    fn compile(&self, webroot: &Path, source: &str) -> Result<Compiled, BundleError> {
        let Some(program) = &self.program else {
            return Err(BundleError::CompilationFailed {
                path: source.to_string(),
                detail: "`sass` executable not found in PATH".to_string(),
            });
        };

        let input = fs_path(webroot, source);
        if !input.exists() {
            return Err(BundleError::SourceNotFound(source.to_string()));
        }

        let workdir = tempfile::tempdir()
            .map_err(|err| BundleError::Io(PathBuf::from("<tempdir>"), err))?;
        let stem = Path::new(source)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("out");
        let output = workdir.path().join(format!("{stem}.css"));

        let result = Command::new(program)
            .arg(&input)
            .arg(&output)
            .arg("--source-map")
            .output()
            .map_err(|err| BundleError::Io(program.clone(), err))?;

        if !result.status.success() {
            return Err(BundleError::CompilationFailed {
                path: source.to_string(),
                detail: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        let mut code = fs::read_to_string(&output)
            .map_err(|err| BundleError::Io(output.clone(), err))?;
        strip_sourcemap_reference(&mut code);

        let map_path = workdir.path().join(format!("{stem}.css.map"));
        let map = match fs::read_to_string(&map_path) {
            Ok(json) => Some(rewrite_map_sources(&json, source)?),
            Err(_) => None,
        };

        Ok(Compiled { code, map })
    }
}

/// Drop a trailing `/*# sourceMappingURL=... */` comment in place.
fn strip_sourcemap_reference(code: &mut String) {
    if let Some(index) = code.rfind("/*# sourceMappingURL=") {
        code.truncate(index);
        code.truncate(code.trim_end().len());
    }
}

/// Point map sources that name the compiled file at its logical path.
///
/// `sass` records its input as a filesystem (or `file://`) path; the
/// merged bundle map should attribute positions to the logical source
/// path instead. Imported partials keep whatever path `sass` gave them.
fn rewrite_map_sources(json: &str, logical: &str) -> Result<String, BundleError> {
    let mut value: serde_json::Value =
        serde_json::from_str(json).map_err(|err| BundleError::SourceMap {
            path: logical.to_string(),
            detail: err.to_string(),
        })?;

    let file_name = Path::new(logical)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(logical);

    if let Some(sources) = value.get_mut("sources").and_then(|s| s.as_array_mut()) {
        for entry in sources {
            let matches = entry.as_str().is_some_and(|s| s.ends_with(file_name));
            if matches {
                *entry = serde_json::Value::String(logical.to_string());
            }
        }
    }

    serde_json::to_string(&value).map_err(|err| BundleError::SourceMap {
        path: logical.to_string(),
        detail: err.to_string(),
    })
}

// ============================================================================
// tests
// ============================================================================
