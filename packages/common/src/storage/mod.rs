mod error;
mod media_id;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use media_id::{MediaId, MediaKind};
pub use traits::{BoxReader, MediaObject, MediaStore, StoredMedia};
