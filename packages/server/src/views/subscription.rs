use sea_orm::DbErr;

use super::{owner_summary, video_summary};
use crate::pipeline::{
    Collection, Document, DocumentSource, Expr, Filter, Pipeline, Projection, SortKey, run,
};

/// Subscribers of `channel_id`, newest first.
///
/// For each subscriber S, `subscriberCount` is S's own follower count and
/// `subscribedToSubscriber` tells whether the channel follows S back.
pub fn channel_subscribers_pipeline(channel_id: &str) -> Pipeline {
    let subscriber = Pipeline::new(Collection::Users)
        .lookup(
            "id",
            "channel_id",
            "followers",
            Pipeline::new(Collection::Subscriptions),
        )
        .add_fields(vec![
            ("subscriberCount", Expr::size("followers")),
            (
                "subscribedToSubscriber",
                Expr::contains("followers", "subscriber_id", channel_id),
            ),
        ])
        .project(
            owner_summary()
                .include("subscriberCount")
                .include("subscribedToSubscriber"),
        );

    Pipeline::new(Collection::Subscriptions)
        .matching(Filter::eq("channel_id", channel_id))
        .sort(vec![SortKey::desc("created_at")])
        .lookup("subscriber_id", "id", "subscriber", subscriber)
        .collapse("subscriber")
        .project(
            Projection::new()
                .include("subscriber")
                .rename("subscribedAt", "created_at"),
        )
}

pub async fn channel_subscribers<S>(source: &S, channel_id: &str) -> Result<Vec<Document>, DbErr>
where
    S: DocumentSource + ?Sized,
{
    run(source, &channel_subscribers_pipeline(channel_id)).await
}

/// Channels `subscriber_id` follows, each with its newest video.
pub fn subscribed_channels_pipeline(subscriber_id: &str) -> Pipeline {
    let channel = Pipeline::new(Collection::Users)
        .lookup(
            "id",
            "owner_id",
            "videos",
            Pipeline::new(Collection::Videos)
                .sort(vec![SortKey::desc("created_at")])
                .limit(1),
        )
        .add_fields(vec![("latestVideo", Expr::first("videos"))])
        .project(owner_summary().nested("latestVideo", "latestVideo", video_summary("")));

    Pipeline::new(Collection::Subscriptions)
        .matching(Filter::eq("subscriber_id", subscriber_id))
        .sort(vec![SortKey::desc("created_at")])
        .lookup("channel_id", "id", "subscribedChannel", channel)
        .collapse("subscribedChannel")
        .project(
            Projection::new()
                .include("subscribedChannel")
                .rename("subscribedAt", "created_at"),
        )
}

pub async fn subscribed_channels<S>(
    source: &S,
    subscriber_id: &str,
) -> Result<Vec<Document>, DbErr>
where
    S: DocumentSource + ?Sized,
{
    run(source, &subscribed_channels_pipeline(subscriber_id)).await
}
