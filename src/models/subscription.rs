use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Full `user_subscriptions` row written on subscription creation.
/// Upserted on the `user_id` unique key, so a repeated creation event
/// overwrites the row instead of erroring or duplicating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSubscription {
    pub user_id: String,
    pub tier_id: i32,
    pub lemonsqueezy_subscription_id: String,
    pub status: Option<String>,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
}

/// Partial update applied on a subscription change. Tier and subscription
/// id are never touched after creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionChange {
    pub status: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub cancel_at_period_end: bool,
}
