//! Content fingerprints and the per-kind bundle manifest.
//!
//! The manifest maps bundle name → hex blake3 digest of the *minified*
//! bundle file. Consumers use it to build cache-busting URLs, so it is
//! only ever written after every bundle of its kind has completed.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use super::error::BundleError;

/// Manifest file name, written into each kind's bundle directory.
pub const MANIFEST_FILE: &str = "bundles.json";

/// Bundle name → hex content checksum.
pub type Manifest = BTreeMap<String, String>;

/// Compute the hex blake3 digest of a file's contents, streaming.
pub fn checksum_file(path: &Path) -> Result<String, BundleError> {
    let file = File::open(path).map_err(|err| BundleError::Io(path.to_path_buf(), err))?;

    let mut reader = BufReader::with_capacity(64 * 1024, file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0u8; 64 * 1024];

    loop {
        match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => {
                hasher.update(&buffer[..n]);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(BundleError::Io(path.to_path_buf(), e)),
        }
    }

    Ok(hex::encode(hasher.finalize().as_bytes()))
}

/// Write the manifest, pretty-printed, into `dir`.
pub fn write(dir: &Path, manifest: &Manifest) -> Result<PathBuf, BundleError> {
    let path = dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(manifest)
        .expect("string map serialization cannot fail");
    fs::write(&path, json + "\n").map_err(|err| BundleError::Io(path.clone(), err))?;
    Ok(path)
}
