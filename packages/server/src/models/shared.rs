use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::pipeline::SortKey;
use crate::views::FeedParams;

/// Envelope returned by every endpoint on success.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            data,
            message: message.into(),
            success: status.is_success(),
        }
    }

    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, data, message)
    }

    pub fn created(data: T, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CREATED, data, message)
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// Parse a resource id, normalizing it to the canonical lowercase form.
pub fn parse_id(raw: &str, label: &str) -> Result<String, AppError> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.to_string())
        .map_err(|_| AppError::Validation(format!("Invalid {label}")))
}

/// Escape LIKE wildcard characters in a search string.
pub fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Trim a required text field, rejecting empty values.
pub fn required_text(value: Option<&str>, name: &str) -> Result<String, AppError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(AppError::Validation(format!("{name} is required"))),
    }
}

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// `page`/`limit` query parameters.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// Page number, 1-based (default 1).
    #[param(example = 1)]
    pub page: Option<i64>,
    /// Items per page (default 10, max 100).
    #[param(example = 10)]
    pub limit: Option<i64>,
}

impl PageQuery {
    /// Validated `(page, limit)`.
    pub fn resolve(&self) -> Result<(u64, u64), AppError> {
        let page = self.page.unwrap_or(DEFAULT_PAGE);
        let limit = self.limit.unwrap_or(DEFAULT_LIMIT);
        if page < 1 {
            return Err(AppError::Validation("page must be >= 1".into()));
        }
        if limit < 1 {
            return Err(AppError::Validation("limit must be >= 1".into()));
        }
        Ok((page as u64, limit.min(MAX_LIMIT) as u64))
    }
}

/// Query parameters of the public video feed.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FeedQuery {
    /// Page number, 1-based (default 1).
    pub page: Option<i64>,
    /// Items per page (default 10, max 100).
    pub limit: Option<i64>,
    /// Case-insensitive search over title and description.
    pub query: Option<String>,
    /// One of `views`, `createdAt`, `duration` (default `createdAt`).
    pub sort_by: Option<String>,
    /// `asc` or `desc` (default `desc`).
    pub sort_type: Option<String>,
    /// Only videos owned by this user.
    pub user_id: Option<String>,
}

impl FeedQuery {
    pub fn resolve(self) -> Result<(FeedParams, u64, u64), AppError> {
        let (page, limit) = PageQuery {
            page: self.page,
            limit: self.limit,
        }
        .resolve()?;

        let field = match self.sort_by.as_deref().unwrap_or("createdAt") {
            "views" => "views",
            "createdAt" => "created_at",
            "duration" => "duration",
            _ => {
                return Err(AppError::Validation(
                    "sortBy must be one of: views, createdAt, duration".into(),
                ));
            }
        };
        let sort = match self.sort_type.as_deref().unwrap_or("desc") {
            "asc" => SortKey::asc(field),
            "desc" => SortKey::desc(field),
            _ => {
                return Err(AppError::Validation(
                    "sortType must be one of: asc, desc".into(),
                ));
            }
        };

        let owner_id = self
            .user_id
            .as_deref()
            .map(|id| parse_id(id, "userId"))
            .transpose()?;

        Ok((
            FeedParams {
                query: self.query,
                owner_id,
                sort,
            },
            page,
            limit,
        ))
    }
}
