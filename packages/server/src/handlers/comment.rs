use axum::extract::{Path, State};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::like::{self, LikeTarget};
use crate::entity::{comment, video};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::comment::{CommentRequest, CommentResponse};
use crate::models::shared::{ApiResponse, PageQuery, parse_id, required_text};
use crate::pipeline::Page;
use crate::state::AppState;
use crate::utils::ownership::find_owned;
use crate::views;

const MAX_COMMENT_CHARS: usize = 2000;

fn validate_content(content: Option<&str>) -> Result<String, AppError> {
    let content = required_text(content, "content")?;
    if content.chars().count() > MAX_COMMENT_CHARS {
        return Err(AppError::Validation(format!(
            "content must be at most {MAX_COMMENT_CHARS} characters"
        )));
    }
    Ok(content)
}

/// Remove every like pointing at one of `target_ids`.
pub(crate) async fn delete_likes_on<C>(
    db: &C,
    kind: LikeTarget,
    target_ids: Vec<String>,
) -> Result<u64, DbErr>
where
    C: ConnectionTrait,
{
    if target_ids.is_empty() {
        return Ok(0);
    }
    let deleted = like::Entity::delete_many()
        .filter(like::Column::TargetKind.eq(kind.as_str()))
        .filter(like::Column::TargetId.is_in(target_ids))
        .exec(db)
        .await?;
    Ok(deleted.rows_affected)
}

#[utoipa::path(
    get,
    path = "/{video_id}",
    tag = "Comments",
    operation_id = "listVideoComments",
    summary = "List comments on a video",
    description = "Paginated comments, newest first. Each comment carries its `owner` (username, fullName, avatar), `likesCount` and whether the caller `isLiked` it.",
    params(("video_id" = String, Path, description = "Video ID"), PageQuery),
    responses(
        (status = 200, description = "Page of comments", body = Page),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, query), fields(user_id = %auth_user.user_id))]
pub async fn list_comments(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    AppQuery(query): AppQuery<PageQuery>,
) -> Result<ApiResponse<Page>, AppError> {
    let video_id = parse_id(&video_id, "videoId")?;
    let (page, limit) = query.resolve()?;

    let exists = video::Entity::find_by_id(video_id.clone())
        .count(&state.db)
        .await?;
    if exists == 0 {
        return Err(AppError::NotFound("Video not found".into()));
    }

    let comments =
        views::video_comments(&state.db, &video_id, &auth_user.user_id, page, limit).await?;
    Ok(ApiResponse::ok(comments, "Comments fetched successfully"))
}

#[utoipa::path(
    post,
    path = "/{video_id}",
    tag = "Comments",
    operation_id = "addComment",
    summary = "Comment on a video",
    params(("video_id" = String, Path, description = "Video ID")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment added", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Video not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn add_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(video_id): Path<String>,
    AppJson(payload): AppJson<CommentRequest>,
) -> Result<ApiResponse<CommentResponse>, AppError> {
    let video_id = parse_id(&video_id, "videoId")?;
    let content = validate_content(payload.content.as_deref())?;

    let exists = video::Entity::find_by_id(video_id.clone())
        .count(&state.db)
        .await?;
    if exists == 0 {
        return Err(AppError::NotFound("Video not found".into()));
    }

    let now = chrono::Utc::now();
    let comment = comment::ActiveModel {
        id: Set(Uuid::now_v7().to_string()),
        video_id: Set(video_id),
        owner_id: Set(auth_user.user_id),
        content: Set(content),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(&state.db)
    .await?;

    Ok(ApiResponse::created(
        CommentResponse::from(comment),
        "Comment added successfully",
    ))
}

#[utoipa::path(
    patch,
    path = "/c/{comment_id}",
    tag = "Comments",
    operation_id = "updateComment",
    summary = "Edit a comment",
    description = "Only the author may edit a comment.",
    params(("comment_id" = String, Path, description = "Comment ID")),
    request_body = CommentRequest,
    responses(
        (status = 200, description = "Comment updated", body = CommentResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn update_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    AppJson(payload): AppJson<CommentRequest>,
) -> Result<ApiResponse<CommentResponse>, AppError> {
    let comment_id = parse_id(&comment_id, "commentId")?;
    let content = validate_content(payload.content.as_deref())?;
    let comment =
        find_owned::<comment::Entity, _>(&state.db, &comment_id, &auth_user.user_id).await?;

    let mut active: comment::ActiveModel = comment.into();
    active.content = Set(content);
    active.updated_at = Set(chrono::Utc::now());
    let comment = active.update(&state.db).await?;

    Ok(ApiResponse::ok(
        CommentResponse::from(comment),
        "Comment updated successfully",
    ))
}

#[utoipa::path(
    delete,
    path = "/c/{comment_id}",
    tag = "Comments",
    operation_id = "deleteComment",
    summary = "Delete a comment",
    description = "Deletes the comment and every like on it. Only the author may delete a comment.",
    params(("comment_id" = String, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment deleted"),
        (status = 400, description = "Invalid comment id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the author (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Comment not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn delete_comment(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> Result<ApiResponse<Option<()>>, AppError> {
    let comment_id = parse_id(&comment_id, "commentId")?;
    find_owned::<comment::Entity, _>(&state.db, &comment_id, &auth_user.user_id).await?;

    let txn = state.db.begin().await?;
    delete_likes_on(&txn, LikeTarget::Comment, vec![comment_id.clone()]).await?;
    comment::Entity::delete_by_id(comment_id).exec(&txn).await?;
    txn.commit().await?;

    Ok(ApiResponse::ok(None, "Comment deleted successfully"))
}
