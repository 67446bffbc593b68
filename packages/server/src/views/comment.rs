use sea_orm::DbErr;

use super::owner_summary;
use crate::pipeline::{
    Collection, DocumentSource, Expr, Filter, Page, Pipeline, Projection, SortKey, paginate,
};

/// Comments on `video_id`, newest first, with like state for `viewer_id`.
pub fn video_comments_pipeline(video_id: &str, viewer_id: &str) -> Pipeline {
    Pipeline::new(Collection::Comments)
        .matching(Filter::eq("video_id", video_id))
        .sort(vec![SortKey::desc("created_at"), SortKey::desc("id")])
        .lookup(
            "owner_id",
            "id",
            "owner",
            Pipeline::new(Collection::Users).project(owner_summary()),
        )
        .lookup(
            "id",
            "target_id",
            "likes",
            Pipeline::new(Collection::Likes).matching(Filter::eq("target_kind", "comment")),
        )
        .add_fields(vec![
            ("owner", Expr::first("owner")),
            ("likesCount", Expr::size("likes")),
            ("isLiked", Expr::contains("likes", "liked_by", viewer_id)),
        ])
        .project(
            Projection::new()
                .include("id")
                .include("content")
                .rename("video", "video_id")
                .include("owner")
                .include("likesCount")
                .include("isLiked")
                .rename("createdAt", "created_at")
                .rename("updatedAt", "updated_at"),
        )
}

pub async fn video_comments<S>(
    source: &S,
    video_id: &str,
    viewer_id: &str,
    page: u64,
    limit: u64,
) -> Result<Page, DbErr>
where
    S: DocumentSource + ?Sized,
{
    paginate(source, &video_comments_pipeline(video_id, viewer_id), page, limit).await
}
