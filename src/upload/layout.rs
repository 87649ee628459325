//! On-disk layout of chunks, artifacts and metadata sidecars
//!
//! ```text
//! <chunk_root>/<identity>/<index>          stored chunk
//! <chunk_root>/<identity>/.<index>.part    chunk being written
//! <artifact_root>/<identity>               assembled artifact
//! <artifact_root>/<identity>.part          artifact being assembled
//! <artifact_root>/<identity>.json          metadata sidecar
//! <artifact_root>/<identity>.json.part     sidecar being written
//! ```

use std::path::{Path, PathBuf};

use super::identity::Identity;

/// Resolves storage paths for an identity
#[derive(Debug, Clone)]
pub struct StorageLayout {
    chunk_root: PathBuf,
    artifact_root: PathBuf,
}

impl StorageLayout {
    pub fn new(chunk_root: impl Into<PathBuf>, artifact_root: impl Into<PathBuf>) -> Self {
        Self {
            chunk_root: chunk_root.into(),
            artifact_root: artifact_root.into(),
        }
    }

    pub fn artifact_root(&self) -> &Path {
        &self.artifact_root
    }

    /// Directory holding every chunk of one identity
    pub fn chunk_dir(&self, identity: &Identity) -> PathBuf {
        self.chunk_root.join(identity.as_str())
    }

    pub fn chunk_path(&self, identity: &Identity, index: u64) -> PathBuf {
        self.chunk_dir(identity).join(index.to_string())
    }

    pub fn chunk_staging_path(&self, identity: &Identity, index: u64) -> PathBuf {
        self.chunk_dir(identity).join(format!(".{}.part", index))
    }

    pub fn artifact_path(&self, identity: &Identity) -> PathBuf {
        self.artifact_root.join(identity.as_str())
    }

    pub fn artifact_staging_path(&self, identity: &Identity) -> PathBuf {
        self.artifact_root.join(format!("{}.part", identity))
    }

    pub fn metadata_path(&self, identity: &Identity) -> PathBuf {
        self.artifact_root.join(format!("{}.json", identity))
    }

    pub fn metadata_staging_path(&self, identity: &Identity) -> PathBuf {
        self.artifact_root.join(format!("{}.json.part", identity))
    }
}

/// Parse a chunk file name into its sequence position.
///
/// Only canonical decimal names are chunks; staging files and anything
/// with leading zeros are skipped.
pub fn parse_chunk_name(name: &str) -> Option<u64> {
    let index: u64 = name.parse().ok()?;
    (index.to_string() == name).then_some(index)
}
