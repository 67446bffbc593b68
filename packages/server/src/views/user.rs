use sea_orm::DbErr;

use super::{owner_summary, video_summary};
use crate::pipeline::{
    Collection, Document, DocumentSource, Expr, Filter, Pipeline, SortKey, run,
};

/// Public channel page for `username` as seen by `viewer_id`.
pub fn channel_profile_pipeline(username: &str, viewer_id: &str) -> Pipeline {
    Pipeline::new(Collection::Users)
        .matching(Filter::eq("username", username.to_lowercase()))
        .lookup(
            "id",
            "channel_id",
            "subscribers",
            Pipeline::new(Collection::Subscriptions),
        )
        .lookup(
            "id",
            "subscriber_id",
            "subscribedTo",
            Pipeline::new(Collection::Subscriptions),
        )
        .add_fields(vec![
            ("subscribersCount", Expr::size("subscribers")),
            ("channelsSubscribedToCount", Expr::size("subscribedTo")),
            (
                "isSubscribed",
                Expr::contains("subscribers", "subscriber_id", viewer_id),
            ),
        ])
        .project(
            owner_summary()
                .include("email")
                .rename("coverImage", "cover_image_url")
                .include("subscribersCount")
                .include("channelsSubscribedToCount")
                .include("isSubscribed")
                .rename("createdAt", "created_at"),
        )
}

pub async fn channel_profile<S>(
    source: &S,
    username: &str,
    viewer_id: &str,
) -> Result<Option<Document>, DbErr>
where
    S: DocumentSource + ?Sized,
{
    let docs = run(source, &channel_profile_pipeline(username, viewer_id)).await?;
    Ok(docs.into_iter().next())
}

/// Videos `user_id` has watched, in the order first watched.
pub fn watch_history_pipeline(user_id: &str) -> Pipeline {
    let video = Pipeline::new(Collection::Videos)
        .lookup("owner_id", "id", "owner", Pipeline::new(Collection::Users))
        .add_fields(vec![("owner", Expr::first("owner"))]);

    Pipeline::new(Collection::WatchHistory)
        .matching(Filter::eq("user_id", user_id))
        .sort(vec![SortKey::asc("watched_at")])
        .lookup("video_id", "id", "video", video)
        .collapse("video")
        .project(
            video_summary("video.")
                .nested("owner", "video.owner", owner_summary())
                .rename("watchedAt", "watched_at"),
        )
}

pub async fn watch_history<S>(source: &S, user_id: &str) -> Result<Vec<Document>, DbErr>
where
    S: DocumentSource + ?Sized,
{
    run(source, &watch_history_pipeline(user_id)).await
}
