use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

use super::error::StorageError;
use super::media_id::{MediaId, MediaKind};
use super::traits::{MediaObject, MediaStore, StoredMedia};

/// Filesystem-backed media store.
///
/// Assets are laid out as `{base_path}/{kind dir}/{key}[.{ext}]` and served
/// from `{public_url}/{public_id}`. Each upload gets a fresh id, even for
/// identical bytes.
pub struct FilesystemMediaStore {
    base_path: PathBuf,
    public_url: String,
    max_size: u64,
}

impl FilesystemMediaStore {
    /// Create the store, making sure every kind directory exists.
    pub async fn new(
        base_path: PathBuf,
        public_url: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        for kind in [MediaKind::Image, MediaKind::Video] {
            fs::create_dir_all(base_path.join(kind.dir_name())).await?;
        }
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            public_url: public_url.into().trim_end_matches('/').to_string(),
            max_size,
        })
    }

    fn asset_path(&self, id: &MediaId) -> PathBuf {
        self.base_path
            .join(id.kind().dir_name())
            .join(id.file_name())
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    fn public_url_for(&self, id: &MediaId) -> String {
        format!("{}/{}", self.public_url, id)
    }

    /// Copy `local_path` into a temp file, then move it into place.
    async fn ingest(&self, local_path: &Path, kind: MediaKind) -> Result<MediaId, StorageError> {
        let source = fs::File::open(local_path).await?;
        let mut reader = BufReader::new(source);
        let temp_path = self.temp_path();
        let mut temp_file = fs::File::create(&temp_path).await?;
        let mut total_bytes: u64 = 0;
        let mut buf = vec![0u8; 64 * 1024];

        loop {
            let n = match reader.read(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    drop(temp_file);
                    let _ = fs::remove_file(&temp_path).await;
                    return Err(e.into());
                }
            };
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                drop(temp_file);
                let _ = fs::remove_file(&temp_path).await;
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            if let Err(e) = temp_file.write_all(&buf[..n]).await {
                drop(temp_file);
                let _ = fs::remove_file(&temp_path).await;
                return Err(e.into());
            }
        }

        temp_file.flush().await?;
        drop(temp_file);

        let extension = local_path.extension().and_then(|ext| ext.to_str());
        let id = MediaId::generate(kind, extension);

        if let Err(e) = fs::rename(&temp_path, self.asset_path(&id)).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(id)
    }
}

#[async_trait]
impl MediaStore for FilesystemMediaStore {
    async fn upload(
        &self,
        local_path: &Path,
        kind: MediaKind,
    ) -> Result<StoredMedia, StorageError> {
        let result = self.ingest(local_path, kind).await;
        if let Err(e) = fs::remove_file(local_path).await
            && e.kind() != std::io::ErrorKind::NotFound
        {
            tracing::warn!(path = %local_path.display(), "Failed to remove uploaded file: {e}");
        }

        let id = result?;
        Ok(StoredMedia {
            url: self.public_url_for(&id),
            public_id: id.to_string(),
        })
    }

    async fn delete(&self, public_id: &str) -> Result<bool, StorageError> {
        let id: MediaId = public_id.parse()?;
        match fs::remove_file(self.asset_path(&id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn open(&self, public_id: &str) -> Result<MediaObject, StorageError> {
        let id: MediaId = public_id.parse()?;
        let path = self.asset_path(&id);
        let file = match fs::File::open(&path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(public_id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let size = file.metadata().await?.len();
        Ok(MediaObject {
            id,
            size,
            reader: Box::new(BufReader::new(file)),
        })
    }
}
