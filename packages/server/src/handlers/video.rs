use axum::extract::{Path, State};
use common::MediaKind;
use sea_orm::prelude::Expr;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::like::LikeTarget;
use crate::entity::{comment, playlist_video, video, watch_history};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::query::AppQuery;
use crate::extractors::upload::MediaForm;
use crate::handlers::comment::delete_likes_on;
use crate::handlers::media::{discard_media, store_upload};
use crate::models::shared::{ApiResponse, FeedQuery, parse_id, required_text};
use crate::models::video::{
    PublishStatusResponse, PublishVideoUpload, UpdateVideoUpload, VideoResponse, parse_duration,
    validate_title,
};
use crate::pipeline::{Document, Page};
use crate::state::AppState;
use crate::utils::edge;
use crate::utils::ownership::find_owned;
use crate::views;

#[utoipa::path(
    get,
    path = "/",
    tag = "Videos",
    operation_id = "listVideos",
    summary = "Browse and search published videos",
    description = "Paginated feed of published videos. `query` searches title and description case-insensitively, `userId` restricts to one owner, and results are sorted by `sortBy` (`views`, `createdAt`, `duration`) in `sortType` order. Each video carries `ownerDetails` (username and avatar).",
    params(FeedQuery),
    responses(
        (status = 200, description = "Page of videos", body = Page),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user, query))]
pub async fn list_videos(
    _auth_user: AuthUser,
    State(state): State<AppState>,
    AppQuery(query): AppQuery<FeedQuery>,
) -> Result<ApiResponse<Page>, AppError> {
    let (params, page, limit) = query.resolve()?;
    let videos = views::feed(&state.db, &params, page, limit).await?;
    Ok(ApiResponse::ok(videos, "Videos fetched successfully"))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Videos",
    operation_id = "publishVideo",
    summary = "Publish a video",
    description = "Uploads a video file and its thumbnail and creates a published video owned by the caller.",
    request_body(content = PublishVideoUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Video published", body = VideoResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, form), fields(user_id = %auth_user.user_id))]
pub async fn publish_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut form: MediaForm,
) -> Result<ApiResponse<VideoResponse>, AppError> {
    let title = validate_title(form.text("title").unwrap_or_default())?;
    let description = required_text(form.text("description"), "description")?;
    let duration = parse_duration(form.text("duration"))?;
    let video_file = form.require_file("videoFile")?;
    let thumbnail = form.require_file("thumbnail")?;

    let video_file = store_upload(&state, video_file, MediaKind::Video).await?;
    let thumbnail = match store_upload(&state, thumbnail, MediaKind::Image).await {
        Ok(stored) => stored,
        Err(e) => {
            discard_media(&state, &[&video_file.public_id]).await;
            return Err(e);
        }
    };

    let now = chrono::Utc::now();
    let new_video = video::ActiveModel {
        id: Set(Uuid::now_v7().to_string()),
        owner_id: Set(auth_user.user_id),
        video_url: Set(video_file.url.clone()),
        video_id: Set(video_file.public_id.clone()),
        thumbnail_url: Set(thumbnail.url.clone()),
        thumbnail_id: Set(thumbnail.public_id.clone()),
        title: Set(title),
        description: Set(description),
        duration: Set(duration),
        views: Set(0),
        is_published: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let video = match new_video.insert(&state.db).await {
        Ok(video) => video,
        Err(e) => {
            discard_media(&state, &[&video_file.public_id, &thumbnail.public_id]).await;
            return Err(e.into());
        }
    };

    Ok(ApiResponse::created(
        VideoResponse::from(video),
        "Video published successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/{video_id}",
    tag = "Videos",
    operation_id = "getVideo",
    summary = "Get a video",
    description = "Video detail with `likesCount`, `isLikedByViewer` and the owner's `subscriberCount` and `isSubscribedByViewer`. Each successful call increments the view counter and records the video in the caller's watch history (once).",
    params(("video_id" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video detail", body = serde_json::Value),
        (status = 400, description = "Invalid video id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<Document>, AppError> {
    let video_id = parse_id(&video_id, "videoId")?;

    let detail = views::video_detail(&state.db, &video_id, &auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".into()))?;

    video::Entity::update_many()
        .col_expr(
            video::Column::Views,
            Expr::col(video::Column::Views).add(1),
        )
        .filter(video::Column::Id.eq(video_id.as_str()))
        .exec(&state.db)
        .await?;

    edge::insert_if_absent(
        &state.db,
        watch_history::ActiveModel {
            user_id: Set(auth_user.user_id),
            video_id: Set(video_id),
            watched_at: Set(chrono::Utc::now()),
        },
    )
    .await?;

    Ok(ApiResponse::ok(detail, "Video fetched successfully"))
}

#[utoipa::path(
    patch,
    path = "/{video_id}",
    tag = "Videos",
    operation_id = "updateVideo",
    summary = "Update a video",
    description = "Updates the title, description and/or thumbnail. Only the owner may update a video. A replaced thumbnail is deleted after the record is written.",
    params(("video_id" = String, Path, description = "Video ID")),
    request_body(content = UpdateVideoUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Video updated", body = VideoResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, form), fields(user_id = %auth_user.user_id))]
pub async fn update_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    mut form: MediaForm,
) -> Result<ApiResponse<VideoResponse>, AppError> {
    let video_id = parse_id(&video_id, "videoId")?;
    let video = find_owned::<video::Entity, _>(&state.db, &video_id, &auth_user.user_id).await?;

    let title = form.text("title").map(validate_title).transpose()?;
    let description = form
        .text("description")
        .map(|d| required_text(Some(d), "description"))
        .transpose()?;
    let thumbnail = form.take_file("thumbnail");
    if title.is_none() && description.is_none() && thumbnail.is_none() {
        return Err(AppError::Validation(
            "At least one of title, description, thumbnail is required".into(),
        ));
    }

    let thumbnail = match thumbnail {
        Some(file) => Some(store_upload(&state, file, MediaKind::Image).await?),
        None => None,
    };

    let previous_thumbnail = video.thumbnail_id.clone();
    let mut active: video::ActiveModel = video.into();
    if let Some(title) = title {
        active.title = Set(title);
    }
    if let Some(description) = description {
        active.description = Set(description);
    }
    if let Some(stored) = &thumbnail {
        active.thumbnail_url = Set(stored.url.clone());
        active.thumbnail_id = Set(stored.public_id.clone());
    }
    active.updated_at = Set(chrono::Utc::now());

    let video = match active.update(&state.db).await {
        Ok(video) => video,
        Err(e) => {
            if let Some(stored) = &thumbnail {
                discard_media(&state, &[&stored.public_id]).await;
            }
            return Err(e.into());
        }
    };

    if thumbnail.is_some() {
        discard_media(&state, &[&previous_thumbnail]).await;
    }

    Ok(ApiResponse::ok(
        VideoResponse::from(video),
        "Video updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/{video_id}",
    tag = "Videos",
    operation_id = "deleteVideo",
    summary = "Delete a video",
    description = "Deletes the video together with its likes, its comments and their likes, playlist memberships and watch-history entries, then removes its media assets. Only the owner may delete a video.",
    params(("video_id" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "Video deleted"),
        (status = 400, description = "Invalid video id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn delete_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<Option<()>>, AppError> {
    let video_id = parse_id(&video_id, "videoId")?;
    let video = find_owned::<video::Entity, _>(&state.db, &video_id, &auth_user.user_id).await?;

    let txn = state.db.begin().await?;

    let comment_ids: Vec<String> = comment::Entity::find()
        .select_only()
        .column(comment::Column::Id)
        .filter(comment::Column::VideoId.eq(video_id.as_str()))
        .into_tuple()
        .all(&txn)
        .await?;

    delete_likes_on(&txn, LikeTarget::Comment, comment_ids).await?;
    delete_likes_on(&txn, LikeTarget::Video, vec![video_id.clone()]).await?;

    comment::Entity::delete_many()
        .filter(comment::Column::VideoId.eq(video_id.as_str()))
        .exec(&txn)
        .await?;
    playlist_video::Entity::delete_many()
        .filter(playlist_video::Column::VideoId.eq(video_id.as_str()))
        .exec(&txn)
        .await?;
    watch_history::Entity::delete_many()
        .filter(watch_history::Column::VideoId.eq(video_id.as_str()))
        .exec(&txn)
        .await?;
    video::Entity::delete_by_id(video_id.clone())
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(video_id, "Video deleted");
    discard_media(&state, &[&video.video_id, &video.thumbnail_id]).await;

    Ok(ApiResponse::ok(None, "Video deleted successfully"))
}

#[utoipa::path(
    patch,
    path = "/toggle/publish/{video_id}",
    tag = "Videos",
    operation_id = "togglePublishStatus",
    summary = "Toggle the publish status of a video",
    description = "Flips `isPublished`. Unpublished videos are hidden from the feed. Only the owner may toggle.",
    params(("video_id" = String, Path, description = "Video ID")),
    responses(
        (status = 200, description = "New publish status", body = PublishStatusResponse),
        (status = 400, description = "Invalid video id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn toggle_publish_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
) -> Result<ApiResponse<PublishStatusResponse>, AppError> {
    let video_id = parse_id(&video_id, "videoId")?;
    let video = find_owned::<video::Entity, _>(&state.db, &video_id, &auth_user.user_id).await?;

    let is_published = !video.is_published;
    let mut active: video::ActiveModel = video.into();
    active.is_published = Set(is_published);
    active.updated_at = Set(chrono::Utc::now());
    active.update(&state.db).await?;

    Ok(ApiResponse::ok(
        PublishStatusResponse { is_published },
        "Video publish status toggled successfully",
    ))
}
