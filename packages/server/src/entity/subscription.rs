use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Directed edge: `subscriber_id` follows the channel `channel_id`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscription")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub subscriber_id: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub channel_id: String,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
