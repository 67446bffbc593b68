use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use common::{MediaKind, StoredMedia};

use crate::error::AppError;
use crate::extractors::upload::UploadedFile;
use crate::state::AppState;

/// Stream a stored media asset.
#[instrument(skip(state))]
pub async fn serve_media(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let object = state.media.open(&public_id).await?;

    let mime = object
        .id
        .extension()
        .map(|ext| mime_guess::from_ext(ext).first_or_octet_stream())
        .unwrap_or(mime_guess::mime::APPLICATION_OCTET_STREAM);

    Response::builder()
        .header(header::CONTENT_TYPE, mime.as_ref())
        .header(header::CONTENT_LENGTH, object.size)
        // Ids are never reused.
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(Body::from_stream(ReaderStream::new(object.reader)))
        .map_err(|e| AppError::Internal(e.to_string()))
}

/// Move an uploaded file into the media store.
pub async fn store_upload(
    state: &AppState,
    file: UploadedFile,
    kind: MediaKind,
) -> Result<StoredMedia, AppError> {
    Ok(state.media.upload(&file.path, kind).await?)
}

/// Delete media assets a record no longer points at.
///
/// Failures are logged and otherwise ignored.
pub async fn discard_media(state: &AppState, public_ids: &[&str]) {
    for &public_id in public_ids {
        if let Err(e) = state.media.delete(public_id).await {
            tracing::warn!(public_id, "Failed to delete media: {e}");
        }
    }
}
