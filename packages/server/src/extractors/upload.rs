use std::collections::HashMap;
use std::path::{Path, PathBuf};

use axum::extract::{FromRequest, Multipart, Request, multipart::Field};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

/// Multipart field names accepted as file uploads.
pub const FILE_SLOTS: &[&str] = &["avatar", "coverImage", "videoFile", "thumbnail"];

/// A file written to the upload directory. Removed on drop unless a media
/// store has already consumed it.
#[derive(Debug)]
pub struct UploadedFile {
    pub path: PathBuf,
    pub file_name: Option<String>,
    pub size: u64,
}

impl Drop for UploadedFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(path = %self.path.display(), "Failed to remove upload: {e}");
        }
    }
}

/// Parsed `multipart/form-data` body: text fields plus the named file slots.
#[derive(Debug, Default)]
pub struct MediaForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MediaForm {
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    pub fn require_file(&mut self, name: &str) -> Result<UploadedFile, AppError> {
        self.take_file(name)
            .ok_or_else(|| AppError::Validation(format!("{name} file is required")))
    }
}

impl FromRequest<AppState> for MediaForm {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;
        let storage = &state.config.storage;

        let mut form = MediaForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if field.file_name().is_some() {
                if !FILE_SLOTS.contains(&name.as_str()) {
                    return Err(AppError::Validation(format!(
                        "Unexpected file field '{name}'"
                    )));
                }
                let file = write_field(field, &storage.upload_dir, storage.max_upload_size).await?;
                form.files.insert(name, file);
            } else {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid field '{name}': {e}")))?;
                form.fields.insert(name, text);
            }
        }

        Ok(form)
    }
}

/// Extension for the stored file, taken from the client file name or else
/// guessed from the content type.
fn upload_extension(file_name: Option<&str>, content_type: Option<&str>) -> Option<String> {
    let from_name = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .filter(|ext| !ext.is_empty() && ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()));

    from_name.or_else(|| {
        content_type
            .and_then(mime_guess::get_mime_extensions_str)
            .and_then(|exts| exts.first())
            .map(|ext| ext.to_string())
    })
}

/// Stream a multipart field into the upload directory.
async fn write_field(
    mut field: Field<'_>,
    upload_dir: &Path,
    max_size: u64,
) -> Result<UploadedFile, AppError> {
    let file_name = field.file_name().map(str::to_string);
    let extension = upload_extension(file_name.as_deref(), field.content_type());
    let stem = Uuid::new_v4().to_string();
    let path = match extension {
        Some(ext) => upload_dir.join(format!("{stem}.{ext}")),
        None => upload_dir.join(stem),
    };

    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create upload dir: {e}")))?;
    let mut temp_file = tokio::fs::File::create(&path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to create upload file: {e}")))?;

    // From here on the file is cleaned up on every exit path.
    let mut upload = UploadedFile {
        path,
        file_name,
        size: 0,
    };

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        upload.size += chunk.len() as u64;
        if upload.size > max_size {
            return Err(AppError::Validation(format!(
                "File exceeds maximum size of {max_size} bytes"
            )));
        }
        temp_file
            .write_all(&chunk)
            .await
            .map_err(|e| AppError::Internal(format!("Upload write failed: {e}")))?;
    }

    temp_file
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("Upload flush failed: {e}")))?;

    Ok(upload)
}
