use axum::extract::{Path, State};
use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use common::MediaKind;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::{ACCESS_TOKEN_COOKIE, AuthUser};
use crate::extractors::json::AppJson;
use crate::extractors::upload::MediaForm;
use crate::handlers::media::{discard_media, store_upload};
use crate::models::auth::{
    AvatarUpload, ChangePasswordRequest, CoverImageUpload, LoginRequest, LoginResponse,
    RegisterForm, RegisterUpload, UpdateAccountRequest, UserResponse, validate_email,
    validate_login_request, validate_password, validate_register_form, validate_username,
};
use crate::models::shared::ApiResponse;
use crate::pipeline::Document;
use crate::state::AppState;
use crate::utils::{hash, jwt};
use crate::views;

fn unique_violation(e: DbErr, message: &str) -> AppError {
    match e.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::Conflict(message.into()),
        _ => AppError::from(e),
    }
}

async fn load_user(db: &DatabaseConnection, user_id: &str) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(user_id.to_owned())
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

#[utoipa::path(
    post,
    path = "/register",
    tag = "Users",
    operation_id = "registerUser",
    summary = "Register a new user",
    description = "Creates an account from a multipart form. `avatar` is required, `coverImage` is optional. The username is stored lowercase.",
    request_body(content = RegisterUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "User registered", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Username or email already taken (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, form))]
pub async fn register(
    State(state): State<AppState>,
    mut form: MediaForm,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let text = |name: &str| form.text(name).unwrap_or_default().to_string();
    let fields = validate_register_form(RegisterForm {
        username: text("username"),
        email: text("email"),
        full_name: text("fullName"),
        password: text("password"),
    })?;
    let avatar = form.require_file("avatar")?;
    let cover_image = form.take_file("coverImage");

    let taken = user::Entity::find()
        .filter(
            Condition::any()
                .add(user::Column::Username.eq(fields.username.as_str()))
                .add(user::Column::Email.eq(fields.email.as_str())),
        )
        .count(&state.db)
        .await?;
    if taken > 0 {
        return Err(AppError::Conflict(
            "User with email or username already exists".into(),
        ));
    }

    let password = hash::hash_password(&fields.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let avatar = store_upload(&state, avatar, MediaKind::Image).await?;
    let cover_image = match cover_image {
        Some(file) => match store_upload(&state, file, MediaKind::Image).await {
            Ok(stored) => Some(stored),
            Err(e) => {
                discard_media(&state, &[&avatar.public_id]).await;
                return Err(e);
            }
        },
        None => None,
    };

    let now = chrono::Utc::now();
    let new_user = user::ActiveModel {
        id: Set(Uuid::now_v7().to_string()),
        username: Set(fields.username),
        email: Set(fields.email),
        full_name: Set(fields.full_name),
        avatar_url: Set(avatar.url.clone()),
        avatar_id: Set(avatar.public_id.clone()),
        cover_image_url: Set(cover_image.as_ref().map(|c| c.url.clone())),
        cover_image_id: Set(cover_image.as_ref().map(|c| c.public_id.clone())),
        password: Set(password),
        created_at: Set(now),
        updated_at: Set(now),
    };

    let user = match new_user.insert(&state.db).await {
        Ok(user) => user,
        Err(e) => {
            let mut uploaded = vec![avatar.public_id.as_str()];
            if let Some(cover) = &cover_image {
                uploaded.push(&cover.public_id);
            }
            discard_media(&state, &uploaded).await;
            return Err(unique_violation(
                e,
                "User with email or username already exists",
            ));
        }
    };

    Ok(ApiResponse::created(
        UserResponse::from(user),
        "User registered successfully",
    ))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Users",
    operation_id = "loginUser",
    summary = "Log in",
    description = "Authenticates by username or email and password. The access token is returned in the body and set as the `accessToken` cookie.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Invalid credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, jar, payload))]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<LoginResponse>), AppError> {
    validate_login_request(&payload)?;

    let mut identity = Condition::any();
    if let Some(username) = payload.username.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        identity = identity.add(user::Column::Username.eq(username.to_lowercase()));
    }
    if let Some(email) = payload.email.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        identity = identity.add(user::Column::Email.eq(email.to_lowercase()));
    }

    let user = user::Entity::find()
        .filter(identity)
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let auth = &state.config.auth;
    let token = jwt::sign(&user.id, &user.username, &auth.jwt_secret, auth.token_ttl_hours)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    let cookie = Cookie::build((ACCESS_TOKEN_COOKIE, token.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/");

    Ok((
        jar.add(cookie),
        ApiResponse::ok(
            LoginResponse {
                user: UserResponse::from(user),
                access_token: token,
            },
            "User logged in successfully",
        ),
    ))
}

#[utoipa::path(
    post,
    path = "/logout",
    tag = "Users",
    operation_id = "logoutUser",
    summary = "Log out",
    description = "Clears the `accessToken` cookie.",
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user, jar), fields(user_id = %auth_user.user_id))]
pub async fn logout(auth_user: AuthUser, jar: CookieJar) -> (CookieJar, ApiResponse<Option<()>>) {
    let mut cookie = Cookie::build((ACCESS_TOKEN_COOKIE, "")).path("/").build();
    cookie.make_removal();
    let jar = jar.add(cookie);
    (jar, ApiResponse::ok(None, "User logged out"))
}

#[utoipa::path(
    get,
    path = "/current-user",
    tag = "Users",
    operation_id = "getCurrentUser",
    summary = "Get the authenticated user",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn current_user(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let user = load_user(&state.db, &auth_user.user_id).await?;
    Ok(ApiResponse::ok(
        UserResponse::from(user),
        "Current user fetched successfully",
    ))
}

#[utoipa::path(
    post,
    path = "/change-password",
    tag = "Users",
    operation_id = "changePassword",
    summary = "Change the password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Wrong old password or invalid new one (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn change_password(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<ApiResponse<Option<()>>, AppError> {
    validate_password(&payload.new_password)?;

    let user = load_user(&state.db, &auth_user.user_id).await?;
    let is_valid = hash::verify_password(&payload.old_password, &user.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;
    if !is_valid {
        return Err(AppError::Validation("Invalid old password".into()));
    }

    let password = hash::hash_password(&payload.new_password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let mut active: user::ActiveModel = user.into();
    active.password = Set(password);
    active.updated_at = Set(chrono::Utc::now());
    active.update(&state.db).await?;

    Ok(ApiResponse::ok(None, "Password changed successfully"))
}

#[utoipa::path(
    patch,
    path = "/update-account",
    tag = "Users",
    operation_id = "updateAccount",
    summary = "Update account details",
    description = "Updates `fullName` and/or `email`. At least one must be given.",
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", body = UserResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Email already in use (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = %auth_user.user_id))]
pub async fn update_account(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateAccountRequest>,
) -> Result<ApiResponse<UserResponse>, AppError> {
    if payload.full_name.is_none() && payload.email.is_none() {
        return Err(AppError::Validation(
            "At least one of fullName, email is required".into(),
        ));
    }

    let user = load_user(&state.db, &auth_user.user_id).await?;
    let mut active: user::ActiveModel = user.into();

    if let Some(full_name) = payload.full_name {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(AppError::Validation("fullName must not be empty".into()));
        }
        active.full_name = Set(full_name.to_string());
    }
    if let Some(email) = payload.email {
        active.email = Set(validate_email(&email)?);
    }
    active.updated_at = Set(chrono::Utc::now());

    let user = active
        .update(&state.db)
        .await
        .map_err(|e| unique_violation(e, "Email is already in use"))?;

    Ok(ApiResponse::ok(
        UserResponse::from(user),
        "Account details updated successfully",
    ))
}

#[utoipa::path(
    patch,
    path = "/avatar",
    tag = "Users",
    operation_id = "updateAvatar",
    summary = "Replace the avatar",
    description = "Uploads a new avatar. The previous asset is deleted once the record points at the new one.",
    request_body(content = AvatarUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Avatar updated", body = UserResponse),
        (status = 400, description = "Missing file (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, form), fields(user_id = %auth_user.user_id))]
pub async fn update_avatar(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut form: MediaForm,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let file = form.require_file("avatar")?;
    let user = load_user(&state.db, &auth_user.user_id).await?;
    let stored = store_upload(&state, file, MediaKind::Image).await?;

    let previous = user.avatar_id.clone();
    let mut active: user::ActiveModel = user.into();
    active.avatar_url = Set(stored.url);
    let new_id = stored.public_id.clone();
    active.avatar_id = Set(stored.public_id);
    active.updated_at = Set(chrono::Utc::now());
    let user = match active.update(&state.db).await {
        Ok(user) => user,
        Err(e) => {
            discard_media(&state, &[&new_id]).await;
            return Err(e.into());
        }
    };

    discard_media(&state, &[&previous]).await;

    Ok(ApiResponse::ok(
        UserResponse::from(user),
        "Avatar image updated successfully",
    ))
}

#[utoipa::path(
    patch,
    path = "/cover-image",
    tag = "Users",
    operation_id = "updateCoverImage",
    summary = "Replace the cover image",
    description = "Uploads a new cover image. The previous asset, if any, is deleted once the record points at the new one.",
    request_body(content = CoverImageUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Cover image updated", body = UserResponse),
        (status = 400, description = "Missing file (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, form), fields(user_id = %auth_user.user_id))]
pub async fn update_cover_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut form: MediaForm,
) -> Result<ApiResponse<UserResponse>, AppError> {
    let file = form.require_file("coverImage")?;
    let user = load_user(&state.db, &auth_user.user_id).await?;
    let stored = store_upload(&state, file, MediaKind::Image).await?;

    let previous = user.cover_image_id.clone();
    let mut active: user::ActiveModel = user.into();
    active.cover_image_url = Set(Some(stored.url));
    let new_id = stored.public_id.clone();
    active.cover_image_id = Set(Some(stored.public_id));
    active.updated_at = Set(chrono::Utc::now());
    let user = match active.update(&state.db).await {
        Ok(user) => user,
        Err(e) => {
            discard_media(&state, &[&new_id]).await;
            return Err(e.into());
        }
    };

    if let Some(previous) = previous {
        discard_media(&state, &[&previous]).await;
    }

    Ok(ApiResponse::ok(
        UserResponse::from(user),
        "Cover image updated successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/c/{username}",
    tag = "Users",
    operation_id = "getChannelProfile",
    summary = "Get a channel profile",
    description = "Public profile of a channel with `subscribersCount`, `channelsSubscribedToCount` and whether the caller `isSubscribed`.",
    params(("username" = String, Path, description = "Channel username (case-insensitive)")),
    responses(
        (status = 200, description = "Channel profile", body = serde_json::Value),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Channel does not exist (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn channel_profile(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<ApiResponse<Document>, AppError> {
    let username = validate_username(&username)?;
    let profile = views::channel_profile(&state.db, &username, &auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Channel does not exist".into()))?;

    Ok(ApiResponse::ok(profile, "User channel fetched successfully"))
}

#[utoipa::path(
    get,
    path = "/history",
    tag = "Users",
    operation_id = "getWatchHistory",
    summary = "Get the caller's watch history",
    description = "Videos the caller has watched, in the order first watched, each with its owner.",
    responses(
        (status = 200, description = "Watch history", body = Vec<serde_json::Value>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn watch_history(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<Document>>, AppError> {
    let history = views::watch_history(&state.db, &auth_user.user_id).await?;
    Ok(ApiResponse::ok(
        history,
        "Watch history fetched successfully",
    ))
}
