use serde::Serialize;

#[derive(Debug, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    /// Whether the caller likes the target after the toggle.
    pub is_liked: bool,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SubscriptionStatus {
    /// Whether the caller is subscribed after the toggle.
    pub subscribed: bool,
}
