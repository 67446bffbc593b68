use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::video;
use crate::error::AppError;

/// A video record as returned by write endpoints.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoResponse {
    pub id: String,
    /// Owner user id.
    pub owner: String,
    pub video_file: String,
    pub thumbnail: String,
    #[schema(example = "Intro to ownership")]
    pub title: String,
    pub description: String,
    /// Length in seconds.
    #[schema(example = 312.5)]
    pub duration: f64,
    pub views: i64,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<video::Model> for VideoResponse {
    fn from(video: video::Model) -> Self {
        Self {
            id: video.id,
            owner: video.owner_id,
            video_file: video.video_url,
            thumbnail: video.thumbnail_url,
            title: video.title,
            description: video.description,
            duration: video.duration,
            views: video.views,
            is_published: video.is_published,
            created_at: video.created_at,
            updated_at: video.updated_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishStatusResponse {
    pub is_published: bool,
}

/// Multipart body of `POST /videos`.
#[allow(dead_code)]
#[derive(utoipa::ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct PublishVideoUpload {
    pub title: String,
    pub description: String,
    /// Length in seconds (default 0).
    pub duration: Option<f64>,
    #[schema(value_type = String, format = Binary)]
    pub video_file: Vec<u8>,
    #[schema(value_type = String, format = Binary)]
    pub thumbnail: Vec<u8>,
}

/// Multipart body of `PATCH /videos/{video_id}`. Every part is optional.
#[allow(dead_code)]
#[derive(utoipa::ToSchema)]
pub struct UpdateVideoUpload {
    pub title: Option<String>,
    pub description: Option<String>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub thumbnail: Option<Vec<u8>>,
}

/// Validate a trimmed title (1-256 Unicode characters).
pub fn validate_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 256 {
        return Err(AppError::Validation(
            "Title must be 1-256 characters".into(),
        ));
    }
    Ok(title.to_string())
}

/// Parse an optional `duration` form field (seconds, non-negative).
pub fn parse_duration(raw: Option<&str>) -> Result<f64, AppError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(0.0);
    };
    match raw.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(seconds),
        _ => Err(AppError::Validation(
            "Duration must be a non-negative number of seconds".into(),
        )),
    }
}
