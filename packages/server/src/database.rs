use std::time::Duration;

use sea_orm::sea_query::{
    Index, IndexCreateStatement, MysqlQueryBuilder, PostgresQueryBuilder, SqliteQueryBuilder,
};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend, DbErr};
use tracing::info;

use crate::entity::{comment, like, playlist, playlist_video, subscription, video, watch_history};

pub async fn init_db(db_url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(max_connections)
        .min_connections(1)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("server::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

/// Ensure the secondary indexes used by the read views exist.
///
/// Schema sync only creates primary keys and unique columns, so the
/// lookup-side indexes are created here on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    let indexes = [
        // Owner lookups and the per-channel latest video.
        (
            "idx_video_owner_created",
            Index::create()
                .if_not_exists()
                .name("idx_video_owner_created")
                .table(video::Entity)
                .col(video::Column::OwnerId)
                .col(video::Column::CreatedAt)
                .to_owned(),
        ),
        // Published feed.
        (
            "idx_video_published_created",
            Index::create()
                .if_not_exists()
                .name("idx_video_published_created")
                .table(video::Entity)
                .col(video::Column::IsPublished)
                .col(video::Column::CreatedAt)
                .to_owned(),
        ),
        (
            "idx_comment_video_created",
            Index::create()
                .if_not_exists()
                .name("idx_comment_video_created")
                .table(comment::Entity)
                .col(comment::Column::VideoId)
                .col(comment::Column::CreatedAt)
                .to_owned(),
        ),
        // Like counts per target; the primary key leads with the liker.
        (
            "idx_like_target",
            Index::create()
                .if_not_exists()
                .name("idx_like_target")
                .table(like::Entity)
                .col(like::Column::TargetKind)
                .col(like::Column::TargetId)
                .to_owned(),
        ),
        (
            "idx_subscription_channel",
            Index::create()
                .if_not_exists()
                .name("idx_subscription_channel")
                .table(subscription::Entity)
                .col(subscription::Column::ChannelId)
                .to_owned(),
        ),
        (
            "idx_playlist_owner",
            Index::create()
                .if_not_exists()
                .name("idx_playlist_owner")
                .table(playlist::Entity)
                .col(playlist::Column::OwnerId)
                .to_owned(),
        ),
        (
            "idx_playlist_video_video",
            Index::create()
                .if_not_exists()
                .name("idx_playlist_video_video")
                .table(playlist_video::Entity)
                .col(playlist_video::Column::VideoId)
                .to_owned(),
        ),
        (
            "idx_watch_history_video",
            Index::create()
                .if_not_exists()
                .name("idx_watch_history_video")
                .table(watch_history::Entity)
                .col(watch_history::Column::VideoId)
                .to_owned(),
        ),
    ];

    let backend = db.get_database_backend();
    for (name, stmt) in &indexes {
        match db.execute_unprepared(&build_index(backend, stmt)).await {
            Ok(_) => info!("Ensured index {} exists", name),
            Err(e) => tracing::warn!("Failed to create index {}: {}", name, e),
        }
    }

    Ok(())
}

fn build_index(backend: DbBackend, stmt: &IndexCreateStatement) -> String {
    match backend {
        DbBackend::Postgres => stmt.to_string(PostgresQueryBuilder),
        DbBackend::MySql => stmt.to_string(MysqlQueryBuilder),
        _ => stmt.to_string(SqliteQueryBuilder),
    }
}
