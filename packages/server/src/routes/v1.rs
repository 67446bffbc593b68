use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::handlers::{comment, like, playlist, subscription, user, video};
use crate::state::AppState;

pub fn routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/users", user_routes())
        .nest("/videos", video_routes())
        .nest("/comments", comment_routes())
        .nest("/likes", like_routes())
        .nest("/subscriptions", subscription_routes())
        .nest("/playlists", playlist_routes())
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(user::register))
        .routes(routes!(user::login))
        .routes(routes!(user::logout))
        .routes(routes!(user::current_user))
        .routes(routes!(user::change_password))
        .routes(routes!(user::update_account))
        .routes(routes!(user::update_avatar))
        .routes(routes!(user::update_cover_image))
        .routes(routes!(user::channel_profile))
        .routes(routes!(user::watch_history))
}

fn video_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(video::list_videos, video::publish_video))
        .routes(routes!(
            video::get_video,
            video::update_video,
            video::delete_video
        ))
        .routes(routes!(video::toggle_publish_status))
}

fn comment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(comment::list_comments, comment::add_comment))
        .routes(routes!(comment::update_comment, comment::delete_comment))
}

fn like_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(like::toggle_video_like))
        .routes(routes!(like::toggle_comment_like))
        .routes(routes!(like::toggle_tweet_like))
        .routes(routes!(like::liked_videos))
}

fn subscription_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            subscription::channel_subscribers,
            subscription::toggle_subscription
        ))
        .routes(routes!(subscription::subscribed_channels))
}

fn playlist_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(playlist::create_playlist))
        .routes(routes!(
            playlist::get_playlist,
            playlist::update_playlist,
            playlist::delete_playlist
        ))
        .routes(routes!(playlist::add_video))
        .routes(routes!(playlist::remove_video))
        .routes(routes!(playlist::user_playlists))
}
