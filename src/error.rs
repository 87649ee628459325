//! HTTP error responses for the Chunkyard server
//!
//! Upload endpoints answer errors in plain text; the metadata endpoint
//! answers with a JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::upload::UploadError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, UploadError>;

impl UploadError {
    /// Stable machine-readable code for this error
    pub fn code(&self) -> &'static str {
        match self {
            UploadError::InvalidIdentity(_) => "INVALID_IDENTITY",
            UploadError::InvalidChunkIndex(_) => "INVALID_CHUNK_INDEX",
            UploadError::MissingField(_) => "MISSING_FIELD",
            UploadError::MalformedForm(_) => "MALFORMED_FORM",
            UploadError::ChunkTooLarge(_) => "CHUNK_TOO_LARGE",
            UploadError::ChunksNotFound(_) => "CHUNKS_NOT_FOUND",
            UploadError::MissingChunks(_) => "MISSING_CHUNKS",
            UploadError::AlreadyCompleted(_) => "ALREADY_COMPLETED",
            UploadError::ArtifactNotFound(_) => "FILE_NOT_FOUND",
            UploadError::MetadataNotFound(_) => "METADATA_NOT_FOUND",
            UploadError::CorruptMetadata { .. } => "CORRUPT_METADATA",
            UploadError::StorageError(_) => "STORAGE_ERROR",
        }
    }

    fn log(&self, status: StatusCode) {
        if status.is_server_error() {
            tracing::error!(code = self.code(), error = %self, "Request failed");
        } else {
            tracing::debug!(code = self.code(), error = %self, "Request rejected");
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        self.log(status);
        (status, self.to_string()).into_response()
    }
}

/// Error body of JSON endpoints
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Wraps an [`UploadError`] so it renders as JSON
#[derive(Debug)]
pub struct JsonError(pub UploadError);

impl From<UploadError> for JsonError {
    fn from(err: UploadError) -> Self {
        Self(err)
    }
}

impl IntoResponse for JsonError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = err.status_code();
        err.log(status);

        let error = match &err {
            UploadError::MetadataNotFound(_) => "Metadata not found".to_string(),
            other => other.to_string(),
        };

        let body = Json(ErrorResponse {
            error,
            code: err.code().to_string(),
        });

        (status, body).into_response()
    }
}
