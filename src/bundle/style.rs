//! Style bundle builder.
//!
//! Each declared source is compiled through the registry entry for its
//! extension, the compiled fragments are concatenated with their maps
//! folded in, and the merged CSS is minified with lightningcss. The
//! printer's map (minified → merged) is composed with the concatenation
//! map (merged → originals) before writing.

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use parcel_sourcemap::SourceMap;
use std::fs;
use std::path::Path;

use super::BundleJob;
use super::compiler::CompilerRegistry;
use super::concat::{Concat, sourcemap_error};
use super::error::BundleError;
use crate::utils::path::fs_path;

/// Build one style bundle: compile, concatenate, minify, write.
pub fn build(job: &BundleJob, registry: &CompilerRegistry) -> Result<(), BundleError> {
    let mut concat = Concat::new(&job.output, "\n");
    for source in &job.sources {
        let extension = Path::new(source)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        let compiler = registry.lookup(extension)?;
        let compiled = compiler.compile(&job.webroot, source)?;
        concat.add(source, &compiled.code, compiled.map.as_deref())?;
    }

    let map_path = format!("{}.map", job.output);
    let (code, mut concat_map) = concat.into_parts();
    let (minified, mut min_map) = minify(&code, &job.output)?;

    min_map
        .extends(&mut concat_map)
        .map_err(|err| sourcemap_error(&job.output, &err))?;
    let map_json = min_map
        .to_json(Some("/"))
        .map_err(|err| sourcemap_error(&job.output, &err))?;

    let minified = format!(
        "{}\n/*# sourceMappingURL={} */\n",
        minified.trim_end(),
        map_path
    );

    let out = fs_path(&job.webroot, &job.output);
    fs::write(&out, minified).map_err(|err| BundleError::Io(out.clone(), err))?;
    let map_out = fs_path(&job.webroot, &map_path);
    fs::write(&map_out, map_json).map_err(|err| BundleError::Io(map_out.clone(), err))?;

    Ok(())
}

/// Minify merged CSS, collecting the printer's source map.
fn minify(code: &str, bundle_path: &str) -> Result<(String, SourceMap), BundleError> {
    let mut map = SourceMap::new("/");
    map.add_source(bundle_path);
    map.set_source_content(0, code)
        .map_err(|err| sourcemap_error(bundle_path, &err))?;

    let stylesheet = StyleSheet::parse(
        code,
        ParserOptions {
            filename: bundle_path.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|err| BundleError::MinificationFailed {
        path: bundle_path.to_string(),
        detail: err.to_string(),
    })?;

    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            source_map: Some(&mut map),
            ..PrinterOptions::default()
        })
        .map_err(|err| BundleError::MinificationFailed {
            path: bundle_path.to_string(),
            detail: err.to_string(),
        })?;

    Ok((result.code, map))
}
