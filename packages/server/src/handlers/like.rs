use axum::extract::{Path, State};
use sea_orm::*;
use tracing::instrument;

use crate::entity::like::{self, LikeTarget};
use crate::entity::{comment, video};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::engagement::LikeStatus;
use crate::models::shared::{ApiResponse, parse_id};
use crate::pipeline::Document;
use crate::state::AppState;
use crate::utils::edge;
use crate::views;

/// Flip the caller's like on `target_id`. Returns whether the like exists
/// afterwards.
async fn toggle_like(
    db: &DatabaseConnection,
    liked_by: String,
    kind: LikeTarget,
    target_id: String,
) -> Result<bool, DbErr> {
    let key = Condition::all()
        .add(like::Column::LikedBy.eq(liked_by.as_str()))
        .add(like::Column::TargetKind.eq(kind.as_str()))
        .add(like::Column::TargetId.eq(target_id.as_str()));

    edge::toggle(
        db,
        key,
        like::ActiveModel {
            liked_by: Set(liked_by),
            target_kind: Set(kind.as_str().to_string()),
            target_id: Set(target_id),
            created_at: Set(chrono::Utc::now()),
        },
    )
    .await
}

fn like_message(is_liked: bool) -> &'static str {
    if is_liked {
        "Liked successfully"
    } else {
        "Unliked successfully"
    }
}

#[utoipa::path(
    post,
    path = "/toggle/v/{video_id}",
    tag = "Likes",
    operation_id = "toggleVideoLike",
    summary = "Like or unlike a video",
    params(("video_id" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Like state after the toggle", body = LikeStatus),
        (status = 400, description = "Invalid video id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn toggle_video_like(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<LikeStatus>, AppError> {
    let video_id = parse_id(&video_id, "videoId")?;
    let exists = video::Entity::find_by_id(video_id.clone())
        .count(&state.db)
        .await?;
    if exists == 0 {
        return Err(AppError::NotFound("Video not found".into()));
    }

    let is_liked = toggle_like(&state.db, auth_user.user_id, LikeTarget::Video, video_id).await?;
    Ok(ApiResponse::ok(LikeStatus { is_liked }, like_message(is_liked)))
}

#[utoipa::path(
    post,
    path = "/toggle/c/{comment_id}",
    tag = "Likes",
    operation_id = "toggleCommentLike",
    summary = "Like or unlike a comment",
    params(("comment_id" = String, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Like state after the toggle", body = LikeStatus),
        (status = 400, description = "Invalid comment id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn toggle_comment_like(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<LikeStatus>, AppError> {
    let comment_id = parse_id(&comment_id, "commentId")?;
    let exists = comment::Entity::find_by_id(comment_id.clone())
        .count(&state.db)
        .await?;
    if exists == 0 {
        return Err(AppError::NotFound("Comment not found".into()));
    }

    let is_liked =
        toggle_like(&state.db, auth_user.user_id, LikeTarget::Comment, comment_id).await?;
    Ok(ApiResponse::ok(LikeStatus { is_liked }, like_message(is_liked)))
}

#[utoipa::path(
    post,
    path = "/toggle/t/{tweet_id}",
    tag = "Likes",
    operation_id = "toggleTweetLike",
    summary = "Like or unlike a tweet",
    description = "Tweets live outside this service, so only the id format is checked.",
    params(("tweet_id" = String, Path, description = "Tweet ID")),
    responses(
        (status = 200, description = "Like state after the toggle", body = LikeStatus),
        (status = 400, description = "Invalid tweet id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn toggle_tweet_like(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(tweet_id): Path<String>,
) -> Result<ApiResponse<LikeStatus>, AppError> {
    let tweet_id = parse_id(&tweet_id, "tweetId")?;
    let is_liked = toggle_like(&state.db, auth_user.user_id, LikeTarget::Tweet, tweet_id).await?;
    Ok(ApiResponse::ok(LikeStatus { is_liked }, like_message(is_liked)))
}

#[utoipa::path(
    get,
    path = "/videos",
    tag = "Likes",
    operation_id = "listLikedVideos",
    summary = "List videos the caller liked",
    description = "Most recently liked first. Each entry is `{likedVideo, likedAt}` with the video's `ownerDetails`.",
    responses(
        (status = 200, description = "Liked videos", body = Vec<serde_json::Value>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn liked_videos(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Document>>, AppError> {
    let videos = views::liked_videos(&state.db, &auth_user.user_id).await?;
    Ok(ApiResponse::ok(videos, "Liked videos fetched successfully"))
}
