use axum::extract::{Path, State};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{playlist, playlist_video, video};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::playlist::{CreatePlaylistRequest, PlaylistResponse, UpdatePlaylistRequest};
use crate::models::shared::{ApiResponse, parse_id, required_text};
use crate::pipeline::Document;
use crate::state::AppState;
use crate::utils::edge;
use crate::utils::ownership::find_owned;
use crate::views;

async fn load_detail(db: &DatabaseConnection, playlist_id: &str) -> Result<Document, AppError> {
    views::playlist_detail(db, playlist_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Playlist not found".into()))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Playlists",
    operation_id = "createPlaylist",
    summary = "Create a playlist",
    request_body = CreatePlaylistRequest,
    responses(
        (status = 201, description = "Playlist created", body = PlaylistResponse),
        (status = 400, description = "Missing name (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn create_playlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePlaylistRequest>,
) -> Result<ApiResponse<PlaylistResponse>, AppError> {
    let name = required_text(payload.name.as_deref(), "name")?;
    let description = payload
        .description
        .map(|d| d.trim().to_string())
        .unwrap_or_default();

    let now = chrono::Utc::now();
    let playlist = playlist::ActiveModel {
        id: Set(Uuid::now_v7().to_string()),
        owner_id: Set(auth_user.user_id),
        name: Set(name),
        description: Set(description),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    Ok(ApiResponse::created(
        PlaylistResponse::from(playlist),
        "Playlist created successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/{playlist_id}",
    tag = "Playlists",
    operation_id = "getPlaylist",
    summary = "Get a playlist",
    description = "The playlist with its published videos in insertion order, `videoCount`, `totalViews` and its owner.",
    params(("playlist_id" = String, Path, description = "Playlist ID")),
    responses(
        (status = 200, description = "Playlist detail", body = serde_json::Value),
        (status = 400, description = "Invalid playlist id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Playlist not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn get_playlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> Result<ApiResponse<Document>, AppError> {
    let playlist_id = parse_id(&playlist_id, "playlistId")?;
    let detail = load_detail(&state.db, &playlist_id).await?;
    Ok(ApiResponse::ok(detail, "Playlist fetched successfully"))
}

#[utoipa::path(
    patch,
    path = "/{playlist_id}",
    tag = "Playlists",
    operation_id = "updatePlaylist",
    summary = "Rename or re-describe a playlist",
    description = "At least one of `name`, `description` is required. Only the owner may update a playlist.",
    params(("playlist_id" = String, Path, description = "Playlist ID")),
    request_body = UpdatePlaylistRequest,
    responses(
        (status = 200, description = "Playlist updated", body = PlaylistResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Playlist not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn update_playlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
    AppJson(payload): AppJson<UpdatePlaylistRequest>,
) -> Result<ApiResponse<PlaylistResponse>, AppError> {
    let playlist_id = parse_id(&playlist_id, "playlistId")?;
    let (name, description) = payload.validate()?;
    let playlist =
        find_owned::<playlist::Entity, _>(&state.db, &playlist_id, &auth_user.user_id).await?;

    let mut active: playlist::ActiveModel = playlist.into();
    if let Some(name) = name {
        active.name = Set(name);
    }
    if let Some(description) = description {
        active.description = Set(description);
    }
    active.updated_at = Set(chrono::Utc::now());
    let playlist = active.update(&state.db).await?;

    Ok(ApiResponse::ok(
        PlaylistResponse::from(playlist),
        "Playlist updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/{playlist_id}",
    tag = "Playlists",
    operation_id = "deletePlaylist",
    summary = "Delete a playlist",
    description = "Deletes the playlist and its memberships. The videos themselves are untouched. Only the owner may delete a playlist.",
    params(("playlist_id" = String, Path, description = "Playlist ID")),
    responses(
        (status = 200, description = "Playlist deleted"),
        (status = 400, description = "Invalid playlist id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Playlist not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn delete_playlist(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(playlist_id): Path<String>,
) -> Result<ApiResponse<Option<()>>, AppError> {
    let playlist_id = parse_id(&playlist_id, "playlistId")?;
    find_owned::<playlist::Entity, _>(&state.db, &playlist_id, &auth_user.user_id).await?;

    let txn = state.db.begin().await?;
    playlist_video::Entity::delete_many()
        .filter(playlist_video::Column::PlaylistId.eq(playlist_id.as_str()))
        .exec(&txn)
        .await?;
    playlist::Entity::delete_by_id(playlist_id).exec(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::ok(None, "Playlist deleted successfully"))
}

#[utoipa::path(
    patch,
    path = "/add/{video_id}/{playlist_id}",
    tag = "Playlists",
    operation_id = "addVideoToPlaylist",
    summary = "Add a video to a playlist",
    description = "Idempotent: adding a video that is already in the playlist changes nothing. The caller must own both the playlist and the video.",
    params(
        ("video_id" = String, Path, description = "Video ID"),
        ("playlist_id" = String, Path, description = "Playlist ID"),
    ),
    responses(
        (status = 200, description = "Playlist detail after the change", body = serde_json::Value),
        (status = 400, description = "Invalid id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Playlist or video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn add_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> Result<ApiResponse<Document>, AppError> {
    let video_id = parse_id(&video_id, "videoId")?;
    let playlist_id = parse_id(&playlist_id, "playlistId")?;
    find_owned::<playlist::Entity, _>(&state.db, &playlist_id, &auth_user.user_id).await?;
    find_owned::<video::Entity, _>(&state.db, &video_id, &auth_user.user_id).await?;

    let added = edge::insert_if_absent(
        &state.db,
        playlist_video::ActiveModel {
            playlist_id: Set(playlist_id.clone()),
            video_id: Set(video_id),
            added_at: Set(chrono::Utc::now()),
        },
    )
    .await?;
    tracing::debug!(added, "Playlist membership written");

    let detail = load_detail(&state.db, &playlist_id).await?;
    Ok(ApiResponse::ok(detail, "Video added to playlist successfully"))
}

#[utoipa::path(
    patch,
    path = "/remove/{video_id}/{playlist_id}",
    tag = "Playlists",
    operation_id = "removeVideoFromPlaylist",
    summary = "Remove a video from a playlist",
    description = "Removing a video that is not in the playlist changes nothing. Only the playlist owner may remove videos.",
    params(
        ("video_id" = String, Path, description = "Video ID"),
        ("playlist_id" = String, Path, description = "Playlist ID"),
    ),
    responses(
        (status = 200, description = "Playlist detail after the change", body = serde_json::Value),
        (status = 400, description = "Invalid id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Playlist not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn remove_video(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((video_id, playlist_id)): Path<(String, String)>,
) -> Result<ApiResponse<Document>, AppError> {
    let video_id = parse_id(&video_id, "videoId")?;
    let playlist_id = parse_id(&playlist_id, "playlistId")?;
    find_owned::<playlist::Entity, _>(&state.db, &playlist_id, &auth_user.user_id).await?;

    playlist_video::Entity::delete_many()
        .filter(playlist_video::Column::PlaylistId.eq(playlist_id.as_str()))
        .filter(playlist_video::Column::VideoId.eq(video_id.as_str()))
        .exec(&state.db)
        .await?;

    let detail = load_detail(&state.db, &playlist_id).await?;
    Ok(ApiResponse::ok(
        detail,
        "Video removed from playlist successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/user/{user_id}",
    tag = "Playlists",
    operation_id = "listUserPlaylists",
    summary = "List a user's playlists",
    description = "Newest first, each with `videoCount` and `totalViews` over the videos that still exist.",
    params(("user_id" = String, Path, description = "Owner (user) ID")),
    responses(
        (status = 200, description = "Playlists", body = Vec<serde_json::Value>),
        (status = 400, description = "Invalid user id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn user_playlists(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> Result<ApiResponse<Vec<Document>>, AppError> {
    let owner_id = parse_id(&owner_id, "userId")?;
    let playlists = views::user_playlists(&state.db, &owner_id).await?;
    Ok(ApiResponse::ok(
        playlists,
        "User playlists fetched successfully",
    ))
}
