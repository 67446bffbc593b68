use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Playlist membership. Ordered by `added_at`; the primary key gives set
/// semantics.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "playlist_video")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub playlist_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub video_id: String,

    pub added_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
