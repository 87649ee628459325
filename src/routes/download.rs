//! Download Routes
//!
//! Endpoints:
//! - GET /download/:identity - Stream the artifact with its stored headers
//! - GET /metadata/:identity - The metadata record as JSON

use axum::{
    body::Body,
    extract::{Path, Request, State},
    http::{header, HeaderValue},
    response::Response,
    routing::get,
    Json, Router,
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::error::{JsonError, Result};
use crate::state::AppState;
use crate::upload::{Identity, MetadataRecord, DEFAULT_CONTENT_TYPE};

/// Create the download router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/download/:identity", get(download))
        .route("/metadata/:identity", get(metadata))
}

/// GET /download/:identity
///
/// Byte serving (ranges, HEAD, conditional requests) is left to
/// `ServeFile`; this handler only resolves the artifact and sets the
/// content type, disposition and ETag from the sidecar.
async fn download(
    State(state): State<AppState>,
    Path(identity): Path<String>,
    request: Request,
) -> Result<Response> {
    let identity = Identity::parse(&identity)?;
    let artifact = state.retrieval().resolve(&identity).await?;

    tracing::debug!(
        identity = %identity,
        file_name = %artifact.display_name(),
        size = artifact.size,
        "Serving file"
    );

    let response = ServeFile::new(&artifact.path)
        .oneshot(request)
        .await
        .unwrap_or_else(|never| match never {});
    let mut response = response.map(Body::new);

    if response.status().is_success() {
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_str(artifact.content_type())
                .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE)),
        );
        headers.insert(
            header::CONTENT_DISPOSITION,
            content_disposition(artifact.display_name()),
        );
        if let Ok(etag) = HeaderValue::from_str(artifact.digest()) {
            headers.insert(header::ETAG, etag);
        }
    }

    Ok(response)
}

/// GET /metadata/:identity
async fn metadata(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> std::result::Result<Json<MetadataRecord>, JsonError> {
    let identity = Identity::parse(&identity)?;
    let record = state.retrieval().metadata(&identity).await?;

    Ok(Json(record))
}

/// `attachment` disposition carrying the display name.
///
/// Header values must be visible ASCII, so other names get a sanitized
/// `filename` plus the exact name in an RFC 5987 `filename*` parameter.
fn content_disposition(display_name: &str) -> HeaderValue {
    let fallback: String = display_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c == ' ' || c.is_ascii_graphic() => c,
            _ => '_',
        })
        .collect();

    let value = if fallback == display_name {
        format!("attachment; filename=\"{}\"", display_name)
    } else {
        format!(
            "attachment; filename=\"{}\"; filename*=UTF-8''{}",
            fallback,
            urlencoding::encode(display_name)
        )
    };

    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_disposition_ascii() {
        assert_eq!(
            content_disposition("greeting.txt"),
            "attachment; filename=\"greeting.txt\""
        );
        assert_eq!(
            content_disposition("my report.pdf"),
            "attachment; filename=\"my report.pdf\""
        );
    }

    #[test]
    fn test_content_disposition_non_ascii() {
        assert_eq!(
            content_disposition("bảng.xlsx"),
            "attachment; filename=\"b_ng.xlsx\"; filename*=UTF-8''b%E1%BA%A3ng.xlsx"
        );
    }

    #[test]
    fn test_content_disposition_quotes() {
        assert_eq!(
            content_disposition("say \"hi\".txt"),
            "attachment; filename=\"say _hi_.txt\"; filename*=UTF-8''say%20%22hi%22.txt"
        );
    }
}
