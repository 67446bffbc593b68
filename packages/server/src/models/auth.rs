use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::user;
use crate::error::AppError;

/// Text fields of the multipart registration form.
#[derive(Debug)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
}

pub fn validate_username(username: &str) -> Result<String, AppError> {
    let username = username.trim().to_lowercase();
    if username.is_empty() || username.chars().count() > 32 {
        return Err(AppError::Validation(
            "Username must be 1-32 characters".into(),
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(AppError::Validation(
            "Username must contain only letters, digits, and underscores".into(),
        ));
    }
    Ok(username)
}

pub fn validate_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !valid || email.chars().count() > 254 {
        return Err(AppError::Validation("Email is invalid".into()));
    }
    Ok(email)
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 8 || password.len() > 128 {
        return Err(AppError::Validation(
            "Password must be 8-128 characters".into(),
        ));
    }
    Ok(())
}

pub fn validate_register_form(form: RegisterForm) -> Result<RegisterForm, AppError> {
    let full_name = form.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(AppError::Validation("fullName is required".into()));
    }
    validate_password(&form.password)?;
    Ok(RegisterForm {
        username: validate_username(&form.username)?,
        email: validate_email(&form.email)?,
        full_name,
        password: form.password,
    })
}

/// Request body for user login. Either `username` or `email` identifies the
/// account.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    #[schema(example = "alice_wonder")]
    pub username: Option<String>,
    #[schema(example = "alice@example.com")]
    pub email: Option<String>,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    let has_identity = [&payload.username, &payload.email]
        .iter()
        .any(|v| v.as_deref().is_some_and(|s| !s.trim().is_empty()));
    if !has_identity {
        return Err(AppError::Validation(
            "Username or email is required".into(),
        ));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Account fields a user may change. At least one must be present.
#[derive(Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    #[schema(example = "Alice Wonder")]
    pub full_name: Option<String>,
    #[schema(example = "alice@example.com")]
    pub email: Option<String>,
}

/// A user's own account, as returned to that user.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    #[schema(example = "alice_wonder")]
    pub username: String,
    pub email: String,
    pub full_name: String,
    /// Avatar URL.
    pub avatar: String,
    /// Cover image URL.
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            avatar: user.avatar_url,
            cover_image: user.cover_image_url,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Successful login response. The token is also set as the
/// `accessToken` cookie.
#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: UserResponse,
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
}

/// Multipart body of `POST /users/register`.
#[allow(dead_code)]
#[derive(utoipa::ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct RegisterUpload {
    #[schema(example = "alice_wonder")]
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    #[schema(value_type = String, format = Binary)]
    pub avatar: Vec<u8>,
    #[schema(value_type = Option<String>, format = Binary)]
    pub cover_image: Option<Vec<u8>>,
}

/// Multipart body of `PATCH /users/avatar`.
#[allow(dead_code)]
#[derive(utoipa::ToSchema)]
pub struct AvatarUpload {
    #[schema(value_type = String, format = Binary)]
    pub avatar: Vec<u8>,
}

/// Multipart body of `PATCH /users/cover-image`.
#[allow(dead_code)]
#[derive(utoipa::ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct CoverImageUpload {
    #[schema(value_type = String, format = Binary)]
    pub cover_image: Vec<u8>,
}
