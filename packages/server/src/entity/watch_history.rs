use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A video in a user's watch history, recorded once at first watch.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "watch_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub video_id: String,

    pub watched_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
