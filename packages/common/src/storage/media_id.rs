use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::StorageError;

const MAX_EXTENSION_LEN: usize = 10;

/// Broad category of an uploaded asset. Determines the top-level directory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Image => "images",
            Self::Video => "videos",
        }
    }

    fn from_dir_name(name: &str) -> Option<Self> {
        match name {
            "images" => Some(Self::Image),
            "videos" => Some(Self::Video),
            _ => None,
        }
    }
}

/// Public identifier of a stored asset: `<kind dir>/<key>[.<ext>]`, where
/// `key` is a fresh UUIDv7 in simple form. Every upload gets its own id, so
/// deleting one record's asset never touches another record's.
///
/// The id doubles as the relative path under the store root, so parsing is
/// strict: anything that is not exactly this shape is rejected before it can
/// reach the filesystem.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MediaId {
    kind: MediaKind,
    key: String,
    extension: Option<String>,
}

impl MediaId {
    pub fn generate(kind: MediaKind, extension: Option<&str>) -> Self {
        Self {
            kind,
            key: uuid::Uuid::now_v7().simple().to_string(),
            extension: extension.and_then(normalize_extension),
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// File name inside the kind directory.
    pub fn file_name(&self) -> String {
        match &self.extension {
            Some(ext) => format!("{}.{}", self.key, ext),
            None => self.key.clone(),
        }
    }
}

/// Lowercases an extension and drops it if it is empty, too long or not
/// plain ASCII alphanumerics.
pub(crate) fn normalize_extension(ext: &str) -> Option<String> {
    let ext = ext.trim().to_ascii_lowercase();
    if ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext)
}

impl FromStr for MediaId {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || StorageError::InvalidId(s.to_string());

        let (dir, file) = s.split_once('/').ok_or_else(invalid)?;
        let kind = MediaKind::from_dir_name(dir).ok_or_else(invalid)?;

        let (key, extension) = match file.split_once('.') {
            Some((key, ext)) => {
                let normalized = normalize_extension(ext).ok_or_else(invalid)?;
                if normalized != ext {
                    return Err(invalid());
                }
                (key, Some(normalized))
            }
            None => (file, None),
        };

        if key.len() != 32
            || !key
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(invalid());
        }

        Ok(Self {
            kind,
            key: key.to_string(),
            extension,
        })
    }
}

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind.dir_name(), self.file_name())
    }
}
