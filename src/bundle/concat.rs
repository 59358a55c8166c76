//! Fragment concatenation with source map folding.
//!
//! Merges an ordered sequence of (path, content, optional map) fragments
//! into one text blob plus one source map. Fragments that arrive with
//! their own map (preprocessor output) are folded in at the current line
//! offset so positions chain through to their real originals; fragments
//! without one are folded as per-line identity mappings attributed to
//! their logical path.
//!
//! Ordering is load-bearing: fragments must be added in declaration
//! order, and the line offset must track the accumulated text exactly,
//! or every downstream attribution is off by the error.

use parcel_sourcemap::SourceMap;

use super::error::BundleError;

/// Running concatenation state for one bundle.
pub struct Concat {
    output_path: String,
    separator: String,
    content: String,
    map: SourceMap,
}

impl Concat {
    /// Start a new concatenation for the bundle at `output_path`.
    pub fn new(output_path: &str, separator: &str) -> Self {
        Self {
            output_path: output_path.to_string(),
            separator: separator.to_string(),
            content: String::new(),
            // Sources are stored relative to the `/` project root; the
            // leading separator comes back as `sourceRoot` when the map
            // is serialized with `to_json(Some("/"))`.
            map: SourceMap::new("/"),
        }
    }

    /// Append one fragment, folding its map into the running map.
    ///
    /// `map_json`, when present, is the fragment's own source map (JSON);
    /// positions then resolve through it to the fragment's original
    /// sources. Without one the fragment is treated as a verbatim block
    /// attributed line-by-line to `path`.
    pub fn add(&mut self, path: &str, code: &str, map_json: Option<&str>) -> Result<(), BundleError> {
        if !self.content.is_empty() {
            self.content.push_str(&self.separator);
        }
        let line_offset = count_lines(&self.content);

        match map_json {
            Some(json) => {
                let mut fragment = SourceMap::from_json("/", json)
                    .map_err(|err| sourcemap_error(path, &err))?;
                self.map
                    .add_sourcemap(&mut fragment, line_offset)
                    .map_err(|err| sourcemap_error(path, &err))?;
            }
            None => {
                self.map
                    .add_empty_map(path, code, line_offset)
                    .map_err(|err| sourcemap_error(path, &err))?;
            }
        }

        self.content.push_str(code);
        Ok(())
    }

    /// The merged text accumulated so far.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Logical path of the bundle being assembled.
    pub fn output_path(&self) -> &str {
        &self.output_path
    }

    /// Consume the concatenation, yielding the merged text and map.
    pub fn into_parts(self) -> (String, SourceMap) {
        (self.content, self.map)
    }
}

/// Zero-based line index at which the next appended character lands.
fn count_lines(text: &str) -> i64 {
    text.matches('\n').count() as i64
}

pub(super) fn sourcemap_error(path: &str, err: &parcel_sourcemap::SourceMapError) -> BundleError {
    BundleError::SourceMap {
        path: path.to_string(),
        detail: format!("{err:?}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_of(map: &mut SourceMap, line: u32, column: u32) -> Option<String> {
        let mapping = map.find_closest_mapping(line, column)?;
        let original = mapping.original?;
        map.get_source(original.source).ok().map(str::to_string)
    }

    #[test]
    fn test_concat_orders_fragments() {
        let mut concat = Concat::new("/js/bundle/app.js", "\n");
        concat.add("/js/src/a.js", "var a = 1;", None).unwrap();
        concat.add("/js/src/b.js", "var b = 2;", None).unwrap();
        concat.add("/js/src/c.js", "var c = 3;", None).unwrap();
        assert_eq!(concat.content(), "var a = 1;\nvar b = 2;\nvar c = 3;");
    }

    #[test]
    fn test_unmapped_fragments_attribute_by_line() {
        let mut concat = Concat::new("/js/bundle/app.js", "\n");
        concat.add("/js/src/a.js", "var a = 1;\nvar a2 = 2;", None).unwrap();
        concat.add("/js/src/b.js", "var b = 3;", None).unwrap();
        let (_, mut map) = concat.into_parts();

        // Lines 0-1 came from a.js, line 2 from b.js. Stored sources are
        // relative to the project root (the leading `/` is stripped).
        assert_eq!(source_of(&mut map, 0, 0).as_deref(), Some("js/src/a.js"));
        assert_eq!(source_of(&mut map, 1, 0).as_deref(), Some("js/src/a.js"));
        assert_eq!(source_of(&mut map, 2, 0).as_deref(), Some("js/src/b.js"));
    }

    #[test]
    fn test_mapped_fragment_chains_to_original() {
        // Simulate preprocessor output for b: compiled css carrying a map
        // that points back to the original .scss file.
        let mut frag_map = SourceMap::new("/");
        frag_map
            .add_empty_map("/css/src/b.scss", "p { color: red; }\nq { color: blue; }", 0)
            .unwrap();
        let frag_json = frag_map.to_json(None).unwrap();

        let mut concat = Concat::new("/css/bundle/site.css", "\n");
        concat.add("/css/src/a.css", "body { margin: 0; }", None).unwrap();
        concat
            .add("/css/src/b.css", "p{color:red}\nq{color:blue}", Some(&frag_json))
            .unwrap();
        let (content, mut map) = concat.into_parts();

        assert_eq!(content, "body { margin: 0; }\np{color:red}\nq{color:blue}");
        // Position inside the second fragment resolves through its own
        // map to the original scss path, offset by the first fragment.
        assert_eq!(source_of(&mut map, 0, 0).as_deref(), Some("css/src/a.css"));
        assert_eq!(source_of(&mut map, 1, 0).as_deref(), Some("css/src/b.scss"));
        assert_eq!(source_of(&mut map, 2, 0).as_deref(), Some("css/src/b.scss"));

        let mapping = map.find_closest_mapping(2, 0).unwrap();
        let original = mapping.original.unwrap();
        // Second line of the fragment maps to the second original line
        assert_eq!(original.original_line, 1);
    }

    #[test]
    fn test_serialized_map_anchors_sources_at_root() {
        let mut concat = Concat::new("/js/bundle/app.js", "\n");
        concat.add("/js/src/a.js", "var a = 1;", None).unwrap();
        let (_, mut map) = concat.into_parts();

        let json = map.to_json(Some("/")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        // Without the root, consumers would resolve the relative source
        // against the map's own directory instead of the webroot.
        assert_eq!(value["sourceRoot"], "/");
        assert_eq!(value["sources"][0], "js/src/a.js");
    }

    #[test]
    fn test_invalid_fragment_map_is_rejected() {
        let mut concat = Concat::new("/css/bundle/site.css", "\n");
        let result = concat.add("/css/src/a.css", "body {}", Some("not json"));
        assert!(matches!(result, Err(BundleError::SourceMap { .. })));
    }

    #[test]
    fn test_empty_concat() {
        let concat = Concat::new("/js/bundle/app.js", "\n");
        assert_eq!(concat.content(), "");
        assert_eq!(concat.output_path(), "/js/bundle/app.js");
    }
}
