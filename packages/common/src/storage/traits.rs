use std::path::Path;

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::AsyncRead;

use super::error::StorageError;
use super::media_id::{MediaId, MediaKind};

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Result of a successful upload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoredMedia {
    /// Stable URL the asset is served from.
    pub url: String,
    /// Identifier used to delete the asset later.
    pub public_id: String,
}

/// An opened asset ready to be streamed.
pub struct MediaObject {
    pub id: MediaId,
    pub size: u64,
    pub reader: BoxReader,
}

/// Storage for user-supplied media (avatars, cover images, videos, thumbnails).
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Move a local file into the store.
    ///
    /// The local file is consumed: it is removed whether or not the upload
    /// succeeds.
    async fn upload(&self, local_path: &Path, kind: MediaKind)
    -> Result<StoredMedia, StorageError>;

    /// Delete an asset by public id.
    ///
    /// Returns `true` if the asset was deleted, `false` if it did not exist.
    async fn delete(&self, public_id: &str) -> Result<bool, StorageError>;

    /// Open an asset for streaming.
    async fn open(&self, public_id: &str) -> Result<MediaObject, StorageError>;
}
