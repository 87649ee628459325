//! Metadata Store
//!
//! Persists the JSON sidecar describing an assembled artifact next to the
//! artifact itself.

use std::io::ErrorKind;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::Identity;
use super::layout::StorageLayout;
use super::types::UploadError;

/// Sidecar record describing an artifact.
///
/// Unknown fields are ignored and the newer fields default, so records
/// written by older or newer servers still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Original, human-readable filename
    pub original_name: String,

    /// Inferred MIME type
    pub content_type: String,

    /// Hex-encoded SHA-256 of the artifact bytes
    pub file_hash: String,

    /// Artifact size in bytes
    #[serde(default)]
    pub size: u64,

    /// Number of chunks the artifact was assembled from
    #[serde(default)]
    pub chunk_count: u64,

    /// When assembly finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Reads and writes metadata sidecars
#[derive(Debug, Clone)]
pub struct MetadataStore {
    layout: StorageLayout,
}

impl MetadataStore {
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    /// Persist the record for an identity, replacing any previous one
    pub async fn put(&self, identity: &Identity, record: &MetadataRecord) -> Result<(), UploadError> {
        let json = serde_json::to_vec(record)
            .map_err(|e| UploadError::StorageError(format!("Failed to marshal metadata: {}", e)))?;

        let staging = self.layout.metadata_staging_path(identity);
        tokio::fs::write(&staging, &json)
            .await
            .map_err(|e| UploadError::storage("Failed to save metadata", e))?;

        if let Err(e) = tokio::fs::rename(&staging, self.layout.metadata_path(identity)).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(UploadError::storage("Failed to save metadata", e));
        }

        Ok(())
    }

    /// Load the record for an identity
    pub async fn get(&self, identity: &Identity) -> Result<MetadataRecord, UploadError> {
        let json = match tokio::fs::read(self.layout.metadata_path(identity)).await {
            Ok(json) => json,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(UploadError::MetadataNotFound(identity.to_string()));
            }
            Err(e) => return Err(UploadError::storage("Failed to read metadata", e)),
        };

        serde_json::from_slice(&json).map_err(|e| UploadError::CorruptMetadata {
            identity: identity.to_string(),
            reason: e.to_string(),
        })
    }

    /// Whether a sidecar exists for an identity
    pub async fn exists(&self, identity: &Identity) -> Result<bool, UploadError> {
        tokio::fs::try_exists(self.layout.metadata_path(identity))
            .await
            .map_err(|e| UploadError::storage("Failed to read metadata", e))
    }

    /// Move the current record out of the served location, into the staging
    /// slot the next `put` writes to. Returns whether a record existed.
    pub async fn set_aside(&self, identity: &Identity) -> Result<bool, UploadError> {
        let staging = self.layout.metadata_staging_path(identity);
        match tokio::fs::rename(self.layout.metadata_path(identity), &staging).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(UploadError::storage("Failed to set metadata aside", e)),
        }
    }

    /// Put a record moved by `set_aside` back in place
    pub async fn restore(&self, identity: &Identity) -> Result<(), UploadError> {
        tokio::fs::rename(
            self.layout.metadata_staging_path(identity),
            self.layout.metadata_path(identity),
        )
        .await
        .map_err(|e| UploadError::storage("Failed to restore metadata", e))
    }
}

// ============================================================================
// Tests
// ============================================================================
