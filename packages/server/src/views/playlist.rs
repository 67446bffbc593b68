use sea_orm::DbErr;

use super::{owner_summary, video_summary};
use crate::pipeline::{
    Collection, Document, DocumentSource, Expr, Filter, Pipeline, Projection, SortKey, run,
};

/// Playlist entries in insertion order, each with its video under
/// `video`. Entries whose video no longer exists (or is filtered out) drop
/// out.
fn entries(published_only: bool) -> Pipeline {
    let mut videos = Pipeline::new(Collection::Videos);
    if published_only {
        videos = videos.matching(Filter::eq("is_published", true));
    }
    Pipeline::new(Collection::PlaylistVideos)
        .sort(vec![SortKey::asc("added_at")])
        .lookup("video_id", "id", "video", videos)
        .collapse("video")
}

pub fn user_playlists_pipeline(owner_id: &str) -> Pipeline {
    Pipeline::new(Collection::Playlists)
        .matching(Filter::eq("owner_id", owner_id))
        .sort(vec![SortKey::desc("created_at")])
        .lookup("id", "playlist_id", "entries", entries(false))
        .add_fields(vec![
            ("videoCount", Expr::size("entries")),
            ("totalViews", Expr::sum("entries", "video.views")),
        ])
        .project(
            Projection::new()
                .include("id")
                .include("name")
                .include("description")
                .include("videoCount")
                .include("totalViews")
                .rename("createdAt", "created_at")
                .rename("updatedAt", "updated_at"),
        )
}

pub async fn user_playlists<S>(source: &S, owner_id: &str) -> Result<Vec<Document>, DbErr>
where
    S: DocumentSource + ?Sized,
{
    run(source, &user_playlists_pipeline(owner_id)).await
}

/// A single playlist with its published videos and owner.
pub fn playlist_detail_pipeline(playlist_id: &str) -> Pipeline {
    Pipeline::new(Collection::Playlists)
        .matching(Filter::eq("id", playlist_id))
        .lookup("id", "playlist_id", "entries", entries(true))
        .lookup("owner_id", "id", "owner", Pipeline::new(Collection::Users))
        .add_fields(vec![
            ("videos", Expr::pluck("entries", "video")),
            ("videoCount", Expr::size("entries")),
            ("totalViews", Expr::sum("entries", "video.views")),
            ("owner", Expr::first("owner")),
        ])
        .project(
            Projection::new()
                .include("id")
                .include("name")
                .include("description")
                .include("videoCount")
                .include("totalViews")
                .nested("videos", "videos", video_summary(""))
                .nested("owner", "owner", owner_summary())
                .rename("createdAt", "created_at")
                .rename("updatedAt", "updated_at"),
        )
}

pub async fn playlist_detail<S>(source: &S, playlist_id: &str) -> Result<Option<Document>, DbErr>
where
    S: DocumentSource + ?Sized,
{
    let docs = run(source, &playlist_detail_pipeline(playlist_id)).await?;
    Ok(docs.into_iter().next())
}
