use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::playlist;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreatePlaylistRequest {
    #[schema(example = "Favs")]
    pub name: Option<String>,
    pub description: Option<String>,
}

/// At least one of `name`, `description` must be present.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdatePlaylistRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl UpdatePlaylistRequest {
    /// Trimmed `(name, description)`; a present name must not be blank.
    pub fn validate(self) -> Result<(Option<String>, Option<String>), AppError> {
        if self.name.is_none() && self.description.is_none() {
            return Err(AppError::Validation(
                "Provide a name or a description to update".into(),
            ));
        }
        let name = match self.name.map(|n| n.trim().to_string()) {
            Some(name) if name.is_empty() => {
                return Err(AppError::Validation("Name must not be empty".into()));
            }
            other => other,
        };
        Ok((name, self.description.map(|d| d.trim().to_string())))
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Owner user id.
    pub owner: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<playlist::Model> for PlaylistResponse {
    fn from(playlist: playlist::Model) -> Self {
        Self {
            id: playlist.id,
            name: playlist.name,
            description: playlist.description,
            owner: playlist.owner_id,
            created_at: playlist.created_at,
            updated_at: playlist.updated_at,
        }
    }
}
