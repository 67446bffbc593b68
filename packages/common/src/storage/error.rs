use thiserror::Error;

/// Errors raised by a media store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No asset exists under the given public id.
    #[error("media not found: {0}")]
    NotFound(String),

    #[error("storage IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The public id does not follow the `<kind>/<key>[.<ext>]` layout.
    #[error("invalid media id: {0}")]
    InvalidId(String),

    /// The uploaded file exceeds the configured size limit.
    #[error("media exceeds size limit ({actual} > {limit} bytes)")]
    SizeLimitExceeded { actual: u64, limit: u64 },
}
