//! Artifact retrieval
//!
//! Resolves an identity to its assembled artifact and metadata so the HTTP
//! layer can set headers and hand the file to a static-file responder.

use std::io::ErrorKind;
use std::path::PathBuf;

use super::identity::Identity;
use super::layout::StorageLayout;
use super::metadata::{MetadataRecord, MetadataStore};
use super::types::UploadError;

/// An artifact ready to be served
#[derive(Debug, Clone)]
pub struct ResolvedArtifact {
    /// Location of the artifact bytes
    pub path: PathBuf,

    /// Size on disk
    pub size: u64,

    /// Sidecar record (display name, content type, digest)
    pub record: MetadataRecord,
}

impl ResolvedArtifact {
    pub fn display_name(&self) -> &str {
        &self.record.original_name
    }

    pub fn content_type(&self) -> &str {
        &self.record.content_type
    }

    pub fn digest(&self) -> &str {
        &self.record.file_hash
    }
}

/// Looks up completed artifacts
#[derive(Debug, Clone)]
pub struct Retrieval {
    layout: StorageLayout,
    metadata_store: MetadataStore,
}

impl Retrieval {
    pub fn new(layout: StorageLayout, metadata_store: MetadataStore) -> Self {
        Self {
            layout,
            metadata_store,
        }
    }

    /// Resolve an identity to its artifact and metadata
    pub async fn resolve(&self, identity: &Identity) -> Result<ResolvedArtifact, UploadError> {
        let path = self.layout.artifact_path(identity);

        let size = match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => meta.len(),
            Ok(_) => return Err(UploadError::ArtifactNotFound(identity.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(UploadError::ArtifactNotFound(identity.to_string()));
            }
            Err(e) => return Err(UploadError::storage("Failed to read file", e)),
        };

        let record = self.metadata_store.get(identity).await?;

        Ok(ResolvedArtifact { path, size, record })
    }

    /// Only the metadata record, for clients inspecting before download
    pub async fn metadata(&self, identity: &Identity) -> Result<MetadataRecord, UploadError> {
        self.metadata_store.get(identity).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn retrieval(temp_dir: &TempDir) -> (Retrieval, MetadataStore, StorageLayout) {
        let layout = StorageLayout::new(temp_dir.path().join("chunks"), temp_dir.path());
        let metadata_store = MetadataStore::new(layout.clone());
        (
            Retrieval::new(layout.clone(), metadata_store.clone()),
            metadata_store,
            layout,
        )
    }

    fn record() -> MetadataRecord {
        MetadataRecord {
            original_name: "photo.png".to_string(),
            content_type: "image/png".to_string(),
            file_hash: "deadbeef".to_string(),
            size: 4,
            chunk_count: 1,
            completed_at: None,
        }
    }

    #[tokio::test]
    async fn test_resolve() {
        let temp_dir = TempDir::new().unwrap();
        let (retrieval, metadata_store, layout) = retrieval(&temp_dir);
        let identity = Identity::from_display_name("photo.png").unwrap();

        tokio::fs::write(layout.artifact_path(&identity), b"\x89PNG").await.unwrap();
        metadata_store.put(&identity, &record()).await.unwrap();

        let resolved = retrieval.resolve(&identity).await.unwrap();
        assert_eq!(resolved.path, layout.artifact_path(&identity));
        assert_eq!(resolved.size, 4);
        assert_eq!(resolved.display_name(), "photo.png");
        assert_eq!(resolved.content_type(), "image/png");
        assert_eq!(resolved.digest(), "deadbeef");
    }

    #[tokio::test]
    async fn test_resolve_missing_artifact() {
        let temp_dir = TempDir::new().unwrap();
        let (retrieval, metadata_store, _) = retrieval(&temp_dir);
        let identity = Identity::from_display_name("photo.png").unwrap();

        metadata_store.put(&identity, &record()).await.unwrap();

        let result = retrieval.resolve(&identity).await;
        assert!(matches!(result, Err(UploadError::ArtifactNotFound(_))));
    }

    #[tokio::test]
    async fn test_resolve_missing_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let (retrieval, _, layout) = retrieval(&temp_dir);
        let identity = Identity::from_display_name("photo.png").unwrap();

        tokio::fs::write(layout.artifact_path(&identity), b"\x89PNG").await.unwrap();

        let result = retrieval.resolve(&identity).await;
        assert!(matches!(result, Err(UploadError::MetadataNotFound(_))));
    }

    #[tokio::test]
    async fn test_resolve_corrupt_metadata() {
        let temp_dir = TempDir::new().unwrap();
        let (retrieval, _, layout) = retrieval(&temp_dir);
        let identity = Identity::from_display_name("photo.png").unwrap();

        tokio::fs::write(layout.artifact_path(&identity), b"\x89PNG").await.unwrap();
        tokio::fs::write(layout.metadata_path(&identity), b"not json").await.unwrap();

        let result = retrieval.resolve(&identity).await;
        assert!(matches!(result, Err(UploadError::CorruptMetadata { .. })));
    }

    #[tokio::test]
    async fn test_metadata_of_unknown_identity() {
        let temp_dir = TempDir::new().unwrap();
        let (retrieval, _, _) = retrieval(&temp_dir);
        let identity = Identity::from_display_name("never.txt").unwrap();

        let result = retrieval.metadata(&identity).await;
        assert!(matches!(result, Err(UploadError::MetadataNotFound(_))));
    }
}
