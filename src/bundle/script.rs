//! Script bundle builder.
//!
//! Reads every declared source, concatenates them in declaration order,
//! minifies the result with oxc and writes the minified bundle plus a
//! composed source map (minified position → concatenated position →
//! original source) next to it.

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use parcel_sourcemap::SourceMap;
use std::fs;
use std::path::PathBuf;

use super::BundleJob;
use super::concat::{Concat, sourcemap_error};
use super::error::BundleError;
use crate::utils::path::fs_path;

/// Build one script bundle: read, concatenate, minify, write.
pub fn build(job: &BundleJob) -> Result<(), BundleError> {
    let mut concat = Concat::new(&job.output, "\n");
    for source in &job.sources {
        let path = fs_path(&job.webroot, source);
        let code = fs::read_to_string(&path)
            .map_err(|err| BundleError::from_read(source, path, err))?;
        concat.add(source, &code, None)?;
    }

    let map_path = format!("{}.map", job.output);
    let (code, mut concat_map) = concat.into_parts();
    let minified = minify(&code, &job.output, &map_path)?;

    // Chain the minifier's map (minified → concatenated) through the
    // concatenation map (concatenated → originals).
    let map_json = match minified.map_json {
        Some(json) => {
            let mut min_map = SourceMap::from_json("/", &json)
                .map_err(|err| sourcemap_error(&job.output, &err))?;
            min_map
                .extends(&mut concat_map)
                .map_err(|err| sourcemap_error(&job.output, &err))?;
            min_map
                .to_json(Some("/"))
                .map_err(|err| sourcemap_error(&job.output, &err))?
        }
        None => concat_map
            .to_json(Some("/"))
            .map_err(|err| sourcemap_error(&job.output, &err))?,
    };

    let code = format!(
        "{}\n//# sourceMappingURL={}\n",
        minified.code.trim_end(),
        map_path
    );

    let out = fs_path(&job.webroot, &job.output);
    fs::write(&out, code).map_err(|err| BundleError::Io(out.clone(), err))?;
    let map_out = fs_path(&job.webroot, &map_path);
    fs::write(&map_out, map_json).map_err(|err| BundleError::Io(map_out.clone(), err))?;

    Ok(())
}

struct Minified {
    code: String,
    map_json: Option<String>,
}

/// Minify concatenated JavaScript, emitting a source map for it.
///
/// Bundle sources are classic scripts, not modules: top-level bindings
/// are globals that consuming pages reference by name, so they must
/// survive compression and keep their names through mangling.
fn minify(source: &str, bundle_path: &str, map_path: &str) -> Result<Minified, BundleError> {
    let allocator = Allocator::default();
    let source_type = SourceType::script();

    let ret = Parser::new(&allocator, source, source_type).parse();
    if !ret.errors.is_empty() {
        let detail = ret
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(BundleError::MinificationFailed {
            path: bundle_path.to_string(),
            detail,
        });
    }

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions {
            top_level: Some(false),
            ..MangleOptions::default()
        }),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);

    let result = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            source_map_path: Some(PathBuf::from(map_path)),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program);

    Ok(Minified {
        code: result.code,
        map_json: result.map.map(|map| map.to_json_string()),
    })
}
