//! Upload Routes
//!
//! Endpoints:
//! - POST /upload - Store one chunk (multipart: fileId, chunkIndex, chunk)
//! - POST /complete/:identity - Assemble stored chunks into the artifact

use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, Path, State},
    http::StatusCode,
    routing::post,
    Router,
};

use crate::error::Result;
use crate::state::AppState;
use crate::upload::{parse_chunk_index, Identity, UploadError};

/// Create the upload router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_chunk))
        .route("/complete/:identity", post(complete))
}

/// POST /upload
///
/// Store a single chunk. Unknown form fields are ignored.
async fn upload_chunk(State(state): State<AppState>, mut multipart: Multipart) -> Result<&'static str> {
    let mut file_id: Option<String> = None;
    let mut chunk_index: Option<String> = None;
    let mut chunk: Option<Bytes> = None;

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "fileId" => file_id = Some(field.text().await.map_err(form_error)?),
            "chunkIndex" => chunk_index = Some(field.text().await.map_err(form_error)?),
            "chunk" => chunk = Some(field.bytes().await.map_err(form_error)?),
            _ => {
                tracing::trace!(field = %name, "Ignoring form field");
            }
        }
    }

    let file_id = file_id.ok_or(UploadError::MissingField("fileId"))?;
    let chunk_index = chunk_index.ok_or(UploadError::MissingField("chunkIndex"))?;
    let chunk = chunk.ok_or(UploadError::MissingField("chunk"))?;

    let identity = Identity::parse(&file_id)?;
    let index = parse_chunk_index(&chunk_index)?;

    state
        .chunk_store()
        .store_chunk(&identity, index, &chunk)
        .await?;

    Ok("Chunk uploaded successfully")
}

/// POST /complete/:identity
///
/// Assemble all stored chunks. Responds with the identity on success.
async fn complete(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<String> {
    let identity = Identity::parse(&identity)?;
    let completed = state.assembler().complete(&identity).await?;

    Ok(completed.identity.to_string())
}

fn form_error(err: MultipartError) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::ChunkTooLarge(err.body_text())
    } else {
        UploadError::MalformedForm(err.body_text())
    }
}
