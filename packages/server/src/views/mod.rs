//! Read-side views. Each view is a [`Pipeline`] over the stored collections
//! plus a small async wrapper that runs it.

mod comment;
mod like;
mod playlist;
mod subscription;
mod user;
mod video;

pub use comment::{video_comments, video_comments_pipeline};
pub use like::{liked_videos, liked_videos_pipeline};
pub use playlist::{
    playlist_detail, playlist_detail_pipeline, user_playlists, user_playlists_pipeline,
};
pub use subscription::{
    channel_subscribers, channel_subscribers_pipeline, subscribed_channels,
    subscribed_channels_pipeline,
};
pub use user::{channel_profile, channel_profile_pipeline, watch_history, watch_history_pipeline};
pub use video::{FeedParams, feed, feed_pipeline, video_detail, video_detail_pipeline};

use crate::pipeline::Projection;

/// Public fields of a user as embedded in other views.
pub(crate) fn owner_summary() -> Projection {
    Projection::new()
        .include("id")
        .include("username")
        .rename("fullName", "full_name")
        .rename("avatar", "avatar_url")
}

/// Public fields of a video. `prefix` selects a nested video document,
/// e.g. `"video."`.
pub(crate) fn video_summary(prefix: &str) -> Projection {
    let at = |path: &str| format!("{prefix}{path}");
    Projection::new()
        .rename("id", &at("id"))
        .rename("videoFile", &at("video_url"))
        .rename("thumbnail", &at("thumbnail_url"))
        .rename("owner", &at("owner_id"))
        .rename("title", &at("title"))
        .rename("description", &at("description"))
        .rename("duration", &at("duration"))
        .rename("views", &at("views"))
        .rename("isPublished", &at("is_published"))
        .rename("createdAt", &at("created_at"))
}
