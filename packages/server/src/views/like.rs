use sea_orm::DbErr;

use super::{owner_summary, video_summary};
use crate::pipeline::{
    Collection, Document, DocumentSource, Filter, Pipeline, Projection, SortKey, run,
};

/// Videos liked by `viewer_id`, most recently liked first.
pub fn liked_videos_pipeline(viewer_id: &str) -> Pipeline {
    let video = Pipeline::new(Collection::Videos)
        .lookup("owner_id", "id", "ownerDetails", Pipeline::new(Collection::Users))
        .collapse("ownerDetails");

    Pipeline::new(Collection::Likes)
        .matching(Filter::eq("liked_by", viewer_id))
        .matching(Filter::eq("target_kind", "video"))
        .sort(vec![SortKey::desc("created_at")])
        .lookup("target_id", "id", "likedVideo", video)
        .collapse("likedVideo")
        .project(
            Projection::new()
                .nested(
                    "likedVideo",
                    "likedVideo",
                    video_summary("").nested("ownerDetails", "ownerDetails", owner_summary()),
                )
                .rename("likedAt", "created_at"),
        )
}

pub async fn liked_videos<S>(source: &S, viewer_id: &str) -> Result<Vec<Document>, DbErr>
where
    S: DocumentSource + ?Sized,
{
    run(source, &liked_videos_pipeline(viewer_id)).await
}
