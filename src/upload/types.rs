//! Upload types shared by the chunk store, assembler and retrieval

use std::path::PathBuf;

// ============================================================================
// Constants
// ============================================================================

/// Default maximum size of a single chunk upload request: 32MB
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 32 * 1024 * 1024;

/// Longest file name the storage directories can hold
pub const MAX_FILE_NAME_LEN: usize = 255;

/// Longest identity accepted. The sidecar staging file `<identity>.json.part`
/// is the longest name stored for an identity and must still fit.
pub const MAX_IDENTITY_LEN: usize = MAX_FILE_NAME_LEN - ".json.part".len();

/// Content type used when the extension is not recognised
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Most missing chunk positions reported in one error
pub const MAX_REPORTED_MISSING: usize = 32;

/// Read buffer used while streaming chunks into an artifact: 64KB
pub const ASSEMBLY_BUFFER_SIZE: usize = 64 * 1024;

// ============================================================================
// Chunk Types
// ============================================================================

/// A stored chunk discovered on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkEntry {
    /// Sequence position parsed from the file name
    pub index: u64,

    /// Location of the chunk bytes
    pub path: PathBuf,
}

// ============================================================================
// Error Types
// ============================================================================

/// Upload error types
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Invalid file identity: {0}")]
    InvalidIdentity(String),

    #[error("Invalid chunk index: {0}")]
    InvalidChunkIndex(String),

    #[error("Missing form field: {0}")]
    MissingField(&'static str),

    #[error("Malformed upload form: {0}")]
    MalformedForm(String),

    #[error("Chunk too large: {0}")]
    ChunkTooLarge(String),

    #[error("No chunks found for {0}")]
    ChunksNotFound(String),

    #[error("Missing chunks: {0:?}")]
    MissingChunks(Vec<u64>),

    #[error("Upload already completed: {0}")]
    AlreadyCompleted(String),

    #[error("File not found: {0}")]
    ArtifactNotFound(String),

    #[error("Metadata not found: {0}")]
    MetadataNotFound(String),

    #[error("Invalid metadata format for {identity}: {reason}")]
    CorruptMetadata { identity: String, reason: String },

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl UploadError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            Self::InvalidIdentity(_) => StatusCode::BAD_REQUEST,
            Self::InvalidChunkIndex(_) => StatusCode::BAD_REQUEST,
            Self::MissingField(_) => StatusCode::BAD_REQUEST,
            Self::MalformedForm(_) => StatusCode::BAD_REQUEST,
            Self::ChunkTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MissingChunks(_) => StatusCode::BAD_REQUEST,
            Self::ChunksNotFound(_) => StatusCode::NOT_FOUND,
            Self::ArtifactNotFound(_) => StatusCode::NOT_FOUND,
            Self::MetadataNotFound(_) => StatusCode::NOT_FOUND,
            Self::AlreadyCompleted(_) => StatusCode::CONFLICT,
            Self::CorruptMetadata { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::StorageError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub(crate) fn storage(context: &str, err: std::io::Error) -> Self {
        Self::StorageError(format!("{}: {}", context, err))
    }
}
