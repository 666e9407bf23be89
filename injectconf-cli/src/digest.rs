//! Reading the graph document and fingerprinting it.

use camino::Utf8Path;
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use sha2::{Digest, Sha256};

use crate::error::InjectconfCliError;

/// Contents of a graph document with its SHA-256 digest.
#[derive(Debug, Clone)]
pub struct GraphInput {
    /// Raw JSON.
    pub json: String,
    /// Lowercase hex digest of `json`.
    pub digest: String,
}

/// Reads `path` and fingerprints it.
///
/// # Errors
///
/// Returns [`InjectconfCliError::Io`] when the file cannot be read and
/// [`InjectconfCliError::InvalidGraphPath`] when `path` names no file.
pub fn read_graph(path: &Utf8Path) -> Result<GraphInput, InjectconfCliError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| InjectconfCliError::InvalidGraphPath(path.to_path_buf()))?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let io_err = |source| InjectconfCliError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(io_err)?;
    let json = dir.read_to_string(file_name).map_err(io_err)?;
    let digest = sha256_hex(json.as_bytes());
    Ok(GraphInput { json, digest })
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn digest_matches_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[rstest]
    fn missing_graph_is_an_io_error() {
        let err = read_graph(Utf8Path::new("does-not-exist/graph.json"));
        assert!(matches!(err, Err(InjectconfCliError::Io { .. })));
    }
}
