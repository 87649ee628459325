//! Chunk Store
//!
//! Local filesystem storage for uploaded chunks before assembly. Each
//! identity owns one directory; each chunk is one file named by its
//! sequence position.

use std::io::ErrorKind;

use super::identity::Identity;
use super::layout::{parse_chunk_name, StorageLayout};
use super::types::{ChunkEntry, UploadError};

/// Parse the textual chunk index sent by clients
pub fn parse_chunk_index(raw: &str) -> Result<u64, UploadError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| UploadError::InvalidChunkIndex(raw.to_string()))
}

/// Filesystem chunk store
#[derive(Debug, Clone)]
pub struct ChunkStore {
    layout: StorageLayout,
}

impl ChunkStore {
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    /// Store one chunk, replacing any previous chunk at the same position.
    ///
    /// The bytes land under a staging name first, so readers only ever see
    /// complete chunks.
    pub async fn store_chunk(
        &self,
        identity: &Identity,
        chunk_index: u64,
        data: &[u8],
    ) -> Result<(), UploadError> {
        let chunk_dir = self.layout.chunk_dir(identity);
        tokio::fs::create_dir_all(&chunk_dir)
            .await
            .map_err(|e| UploadError::storage("Failed to create chunk directory", e))?;

        let staging = self.layout.chunk_staging_path(identity, chunk_index);
        tokio::fs::write(&staging, data)
            .await
            .map_err(|e| UploadError::storage("Failed to save chunk", e))?;

        let path = self.layout.chunk_path(identity, chunk_index);
        if let Err(e) = tokio::fs::rename(&staging, &path).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(UploadError::storage("Failed to save chunk", e));
        }

        tracing::debug!(
            identity = %identity,
            chunk_index = chunk_index,
            size = data.len(),
            "Chunk stored"
        );

        Ok(())
    }

    /// List the chunks of an identity in ascending numeric order.
    ///
    /// Directory listings are unordered (and lexicographic at best, which
    /// puts "10" before "2"), so entries are sorted by parsed position.
    pub async fn list_chunks(&self, identity: &Identity) -> Result<Vec<ChunkEntry>, UploadError> {
        let chunk_dir = self.layout.chunk_dir(identity);

        let mut entries = match tokio::fs::read_dir(&chunk_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(UploadError::ChunksNotFound(identity.to_string()));
            }
            Err(e) => return Err(UploadError::storage("Failed to read chunks directory", e)),
        };

        let mut chunks = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| UploadError::storage("Failed to read chunks directory", e))?
        {
            let file_name = entry.file_name();
            let Some(index) = file_name.to_str().and_then(parse_chunk_name) else {
                tracing::trace!(
                    identity = %identity,
                    entry = ?file_name,
                    "Skipping non-chunk entry"
                );
                continue;
            };

            let file_type = entry
                .file_type()
                .await
                .map_err(|e| UploadError::storage("Failed to read chunks directory", e))?;
            if !file_type.is_file() {
                continue;
            }

            chunks.push(ChunkEntry {
                index,
                path: entry.path(),
            });
        }

        chunks.sort_by_key(|chunk| chunk.index);
        Ok(chunks)
    }

    /// Delete all chunks for an identity, returning how many were removed
    pub async fn delete_chunks(&self, identity: &Identity) -> Result<usize, UploadError> {
        let chunk_dir = self.layout.chunk_dir(identity);

        let mut entries = match tokio::fs::read_dir(&chunk_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(UploadError::storage("Failed to read chunks directory", e)),
        };

        let mut count = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| UploadError::storage("Failed to read chunks directory", e))?
        {
            tokio::fs::remove_file(entry.path())
                .await
                .map_err(|e| UploadError::storage("Failed to remove chunk", e))?;
            count += 1;
        }

        tokio::fs::remove_dir(&chunk_dir)
            .await
            .map_err(|e| UploadError::storage("Failed to remove chunks directory", e))?;

        Ok(count)
    }
}

// ============================================================================
// Tests
// ============================================================================
