use axum::extract::{Path, State};
use sea_orm::*;
use tracing::instrument;

use crate::entity::{subscription, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::engagement::SubscriptionStatus;
use crate::models::shared::{ApiResponse, parse_id};
use crate::pipeline::Document;
use crate::state::AppState;
use crate::utils::edge;
use crate::views;

async fn require_channel(db: &DatabaseConnection, channel_id: &str) -> Result<(), AppError> {
    let exists = user::Entity::find_by_id(channel_id.to_owned())
        .count(db)
        .await?;
    if exists == 0 {
        return Err(AppError::NotFound("Channel not found".into()));
    }
    Ok(())
}

#[utoipa::path(
    post,
    path = "/c/{channel_id}",
    tag = "Subscriptions",
    operation_id = "toggleSubscription",
    summary = "Subscribe to or unsubscribe from a channel",
    params(("channel_id" = String, Path, description = "Channel (user) ID")),
    responses(
        (status = 200, description = "Subscription state after the toggle", body = SubscriptionStatus),
        (status = 400, description = "Invalid id or own channel (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Channel not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn toggle_subscription(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<SubscriptionStatus>, AppError> {
    let channel_id = parse_id(&channel_id, "channelId")?;
    if channel_id == auth_user.user_id {
        return Err(AppError::Validation(
            "You cannot subscribe to your own channel".into(),
        ));
    }
    require_channel(&state.db, &channel_id).await?;

    let key = Condition::all()
        .add(subscription::Column::SubscriberId.eq(auth_user.user_id.as_str()))
        .add(subscription::Column::ChannelId.eq(channel_id.as_str()));
    let subscribed = edge::toggle(
        &state.db,
        key,
        subscription::ActiveModel {
            subscriber_id: Set(auth_user.user_id),
            channel_id: Set(channel_id),
            created_at: Set(chrono::Utc::now()),
        },
    )
    .await?;

    let message = if subscribed {
        "Subscribed successfully"
    } else {
        "Unsubscribed successfully"
    };
    Ok(ApiResponse::ok(SubscriptionStatus { subscribed }, message))
}

#[utoipa::path(
    get,
    path = "/c/{channel_id}",
    tag = "Subscriptions",
    operation_id = "listChannelSubscribers",
    summary = "List a channel's subscribers",
    description = "Only the channel itself may list its subscribers. Each entry carries the subscriber's own `subscriberCount` and `subscribedToSubscriber`, true when the channel follows that subscriber back.",
    params(("channel_id" = String, Path, description = "Channel (user) ID")),
    responses(
        (status = 200, description = "Subscribers", body = Vec<serde_json::Value>),
        (status = 400, description = "Invalid channel id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Not the channel owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Channel not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn channel_subscribers(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(channel_id): Path<String>,
) -> Result<ApiResponse<Vec<Document>>, AppError> {
    let channel_id = parse_id(&channel_id, "channelId")?;
    require_channel(&state.db, &channel_id).await?;
    if channel_id != auth_user.user_id {
        return Err(AppError::PermissionDenied(
            "You can only view the subscribers of your own channel".into(),
        ));
    }

    let subscribers = views::channel_subscribers(&state.db, &channel_id).await?;
    Ok(ApiResponse::ok(
        subscribers,
        "Subscribers fetched successfully",
    ))
}

#[utoipa::path(
    get,
    path = "/u/{subscriber_id}",
    tag = "Subscriptions",
    operation_id = "listSubscribedChannels",
    summary = "List the channels a user subscribes to",
    description = "Each entry is `{subscribedChannel, subscribedAt}`; the channel carries its newest video as `latestVideo`.",
    params(("subscriber_id" = String, Path, description = "Subscriber (user) ID")),
    responses(
        (status = 200, description = "Subscribed channels", body = Vec<serde_json::Value>),
        (status = 400, description = "Invalid subscriber id (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = %auth_user.user_id))]
pub async fn subscribed_channels(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(subscriber_id): Path<String>,
) -> Result<ApiResponse<Vec<Document>>, AppError> {
    let subscriber_id = parse_id(&subscriber_id, "subscriberId")?;
    let channels = views::subscribed_channels(&state.db, &subscriber_id).await?;
    Ok(ApiResponse::ok(
        channels,
        "Subscribed channels fetched successfully",
    ))
}
