//! Assembler
//!
//! Turns the stored chunks of an identity into an artifact plus its
//! metadata sidecar:
//!
//! 1. Take the identity's completion lock
//! 2. List chunks in numeric order and check none are missing
//! 3. Stream every chunk into a staging file while hashing the same bytes
//! 4. Move the staging file over the artifact
//! 5. Write the metadata sidecar
//! 6. Delete the chunks (best-effort)
//!
//! The sidecar is written only after the artifact is complete on disk, and
//! a stale sidecar from an earlier completion is set aside while the new
//! artifact takes its place. If that move fails the old sidecar is put
//! back, so the previous artifact stays served. An artifact without a
//! sidecar is never served.

use std::path::Path;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};

use super::chunk_store::ChunkStore;
use super::content_type;
use super::identity::Identity;
use super::layout::StorageLayout;
use super::locks::CompletionLocks;
use super::metadata::{MetadataRecord, MetadataStore};
use super::types::{ChunkEntry, UploadError, ASSEMBLY_BUFFER_SIZE, MAX_REPORTED_MISSING};

/// Result of a successful completion
#[derive(Debug, Clone)]
pub struct CompletedUpload {
    pub identity: Identity,
    pub record: MetadataRecord,
}

/// Assembles chunks into artifacts
#[derive(Debug, Clone)]
pub struct Assembler {
    layout: StorageLayout,
    chunk_store: ChunkStore,
    metadata_store: MetadataStore,
    locks: CompletionLocks,
}

impl Assembler {
    pub fn new(
        layout: StorageLayout,
        chunk_store: ChunkStore,
        metadata_store: MetadataStore,
        locks: CompletionLocks,
    ) -> Self {
        Self {
            layout,
            chunk_store,
            metadata_store,
            locks,
        }
    }

    /// Assemble every stored chunk of `identity` into its artifact
    pub async fn complete(&self, identity: &Identity) -> Result<CompletedUpload, UploadError> {
        let _guard = self.locks.acquire(identity).await;

        tokio::fs::create_dir_all(self.layout.artifact_root())
            .await
            .map_err(|e| UploadError::storage("Failed to create uploads directory", e))?;

        let chunks = match self.chunk_store.list_chunks(identity).await {
            Ok(chunks) if !chunks.is_empty() => chunks,
            Ok(_) | Err(UploadError::ChunksNotFound(_)) => {
                if self.metadata_store.exists(identity).await? {
                    return Err(UploadError::AlreadyCompleted(identity.to_string()));
                }
                return Err(UploadError::ChunksNotFound(identity.to_string()));
            }
            Err(e) => return Err(e),
        };

        let missing = missing_positions(&chunks, MAX_REPORTED_MISSING);
        if !missing.is_empty() {
            return Err(UploadError::MissingChunks(missing));
        }

        tracing::info!(
            identity = %identity,
            file_name = %identity.display_name(),
            chunks = chunks.len(),
            "Assembling file from chunks"
        );

        let staging = self.layout.artifact_staging_path(identity);
        let (file_hash, size) = match write_artifact(&staging, &chunks).await {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&staging).await;
                return Err(e);
            }
        };

        let previous = self.metadata_store.set_aside(identity).await?;

        if let Err(e) = tokio::fs::rename(&staging, self.layout.artifact_path(identity)).await {
            let _ = tokio::fs::remove_file(&staging).await;
            if previous {
                if let Err(restore_err) = self.metadata_store.restore(identity).await {
                    tracing::warn!(
                        identity = %identity,
                        error = %restore_err,
                        "Failed to restore previous metadata"
                    );
                }
            }
            return Err(UploadError::storage("Failed to store output file", e));
        }

        let record = MetadataRecord {
            original_name: identity.display_name().to_string(),
            content_type: content_type::infer(identity.display_name()).to_string(),
            file_hash,
            size,
            chunk_count: chunks.len() as u64,
            completed_at: Some(Utc::now()),
        };
        self.metadata_store.put(identity, &record).await?;

        match self.chunk_store.delete_chunks(identity).await {
            Ok(count) => {
                tracing::debug!(identity = %identity, count = count, "Cleaned up chunks");
            }
            Err(e) => {
                tracing::warn!(identity = %identity, error = %e, "Failed to clean up chunks");
            }
        }

        tracing::info!(
            identity = %identity,
            file_name = %record.original_name,
            content_type = %record.content_type,
            file_hash = %record.file_hash,
            size = record.size,
            "Upload completed"
        );

        Ok(CompletedUpload {
            identity: identity.clone(),
            record,
        })
    }
}

/// Stream chunks into `dest` in order, hashing in the same pass.
/// Returns the hex digest and the number of bytes written.
async fn write_artifact(dest: &Path, chunks: &[ChunkEntry]) -> Result<(String, u64), UploadError> {
    let file = File::create(dest)
        .await
        .map_err(|e| UploadError::storage("Failed to create output file", e))?;
    let mut out = BufWriter::new(file);

    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; ASSEMBLY_BUFFER_SIZE];
    let mut size = 0u64;

    for chunk in chunks {
        let mut input = File::open(&chunk.path)
            .await
            .map_err(|e| UploadError::storage("Failed to open chunk", e))?;

        loop {
            let n = input
                .read(&mut buf)
                .await
                .map_err(|e| UploadError::storage("Failed to merge chunk", e))?;
            if n == 0 {
                break;
            }

            hasher.update(&buf[..n]);
            out.write_all(&buf[..n])
                .await
                .map_err(|e| UploadError::storage("Failed to merge chunk", e))?;
            size += n as u64;
        }
    }

    out.flush()
        .await
        .map_err(|e| UploadError::storage("Failed to write output file", e))?;
    out.into_inner()
        .sync_all()
        .await
        .map_err(|e| UploadError::storage("Failed to write output file", e))?;

    Ok((hex::encode(hasher.finalize()), size))
}

/// Positions absent from `0..=last`, given chunks sorted by index
fn missing_positions(chunks: &[ChunkEntry], limit: usize) -> Vec<u64> {
    let mut missing = Vec::new();
    let mut expected = 0u64;

    for chunk in chunks {
        while expected < chunk.index && missing.len() < limit {
            missing.push(expected);
            expected += 1;
        }
        if missing.len() >= limit {
            break;
        }
        expected = chunk.index.saturating_add(1);
    }

    missing
}

// ============================================================================
// Tests
// ============================================================================
