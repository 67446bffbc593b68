use sea_orm::DbErr;

use super::{owner_summary, video_summary};
use crate::pipeline::{
    Collection, Document, DocumentSource, Expr, Filter, Page, Pipeline, Projection, SortKey,
    paginate, run,
};

/// Video with its like state and owner channel as seen by `viewer_id`.
pub fn video_detail_pipeline(video_id: &str, viewer_id: &str) -> Pipeline {
    let owner = Pipeline::new(Collection::Users)
        .lookup(
            "id",
            "channel_id",
            "subscribers",
            Pipeline::new(Collection::Subscriptions),
        )
        .add_fields(vec![
            ("subscriberCount", Expr::size("subscribers")),
            (
                "isSubscribedByViewer",
                Expr::contains("subscribers", "subscriber_id", viewer_id),
            ),
        ])
        .project(
            owner_summary()
                .include("subscriberCount")
                .include("isSubscribedByViewer"),
        );

    Pipeline::new(Collection::Videos)
        .matching(Filter::eq("id", video_id))
        .lookup(
            "id",
            "target_id",
            "likes",
            Pipeline::new(Collection::Likes).matching(Filter::eq("target_kind", "video")),
        )
        .lookup("owner_id", "id", "owner", owner)
        .collapse("owner")
        .add_fields(vec![
            ("likesCount", Expr::size("likes")),
            (
                "isLikedByViewer",
                Expr::contains("likes", "liked_by", viewer_id),
            ),
        ])
        .project(
            video_summary("")
                .include("owner")
                .include("likesCount")
                .include("isLikedByViewer"),
        )
}

pub async fn video_detail<S>(
    source: &S,
    video_id: &str,
    viewer_id: &str,
) -> Result<Option<Document>, DbErr>
where
    S: DocumentSource + ?Sized,
{
    let docs = run(source, &video_detail_pipeline(video_id, viewer_id)).await?;
    Ok(docs.into_iter().next())
}

/// Filters and ordering for the public video feed.
#[derive(Clone, Debug, PartialEq)]
pub struct FeedParams {
    /// Case-insensitive search over title and description.
    pub query: Option<String>,
    pub owner_id: Option<String>,
    pub sort: SortKey,
}

pub fn feed_pipeline(params: &FeedParams) -> Pipeline {
    let mut pipeline = Pipeline::new(Collection::Videos);
    if let Some(query) = params.query.as_deref().map(str::trim)
        && !query.is_empty()
    {
        pipeline = pipeline.matching(Filter::text(&["title", "description"], query));
    }
    if let Some(owner_id) = &params.owner_id {
        pipeline = pipeline.matching(Filter::eq("owner_id", owner_id.as_str()));
    }

    pipeline
        .matching(Filter::eq("is_published", true))
        .sort(vec![params.sort.clone(), SortKey::asc("id")])
        .lookup(
            "owner_id",
            "id",
            "ownerDetails",
            Pipeline::new(Collection::Users).project(
                Projection::new()
                    .include("id")
                    .include("username")
                    .rename("avatar", "avatar_url"),
            ),
        )
        // Users are never deleted, so every video has exactly one owner.
        .add_fields(vec![("ownerDetails", Expr::first("ownerDetails"))])
        .project(
            video_summary("")
                .include("ownerDetails")
                .rename("updatedAt", "updated_at"),
        )
}

pub async fn feed<S>(source: &S, params: &FeedParams, page: u64, limit: u64) -> Result<Page, DbErr>
where
    S: DocumentSource + ?Sized,
{
    paginate(source, &feed_pipeline(params), page, limit).await
}
