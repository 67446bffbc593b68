pub mod storage;

pub use storage::{MediaKind, MediaStore, StorageError, StoredMedia};
