use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::comment;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CommentRequest {
    #[schema(example = "Great video!")]
    pub content: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub content: String,
    /// Video id.
    pub video: String,
    /// Author user id.
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<comment::Model> for CommentResponse {
    fn from(comment: comment::Model) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            video: comment.video_id,
            owner: comment.owner_id,
            created_at: comment.created_at,
            updated_at: comment.updated_at,
        }
    }
}
