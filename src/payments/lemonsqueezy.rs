use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result, msg};

type HmacSha256 = Hmac<Sha256>;

/// Verifies `x-signature` headers on LemonSqueezy webhook deliveries.
///
/// Built without a secret, every delivery is accepted. That open mode exists
/// for local development and logs a warning on each request so it cannot go
/// unnoticed.
#[derive(Debug, Clone)]
pub struct WebhookVerifier {
    secret: Option<String>,
}

impl WebhookVerifier {
    pub fn new(secret: Option<String>) -> Self {
        Self { secret }
    }

    /// True when a secret is configured and signatures are checked.
    pub fn enforcing(&self) -> bool {
        self.secret.is_some()
    }

    /// Checks the signature header value against an HMAC-SHA256 of the raw
    /// request body. A missing header fails verification unless no secret is
    /// configured.
    pub fn verify(&self, payload: &[u8], signature: Option<&str>) -> Result<bool> {
        let Some(secret) = self.secret.as_deref() else {
            tracing::warn!(
                "LEMONSQUEEZY_WEBHOOK_SECRET is not set, accepting webhook without signature verification"
            );
            return Ok(true);
        };
        let Some(signature) = signature else {
            return Ok(false);
        };

        let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|_| AppError::Config(msg::INVALID_WEBHOOK_SECRET.into()))?;
        mac.update(payload);
        let expected = hex::encode(mac.finalize().into_bytes());

        // Use constant-time comparison to prevent timing attacks.
        // An attacker could otherwise measure response times to progressively
        // discover the correct signature byte-by-byte.
        let expected_bytes = expected.as_bytes();
        let provided_bytes = signature.as_bytes();

        // Length check is not constant-time, but that's fine - signature length
        // is not secret (it's always 64 hex chars for SHA-256)
        if expected_bytes.len() != provided_bytes.len() {
            return Ok(false);
        }

        Ok(expected_bytes.ct_eq(provided_bytes).into())
    }
}

/// Generic LemonSqueezy webhook event - attributes parsed based on event_name
#[derive(Debug, Deserialize)]
pub struct LemonSqueezyWebhookEvent {
    /// Event name at the top level of the body, where some senders place it.
    #[serde(rename = "event_name")]
    pub top_level_event_name: Option<String>,
    pub meta: LemonSqueezyMeta,
    pub data: LemonSqueezyEventData,
}

impl LemonSqueezyWebhookEvent {
    /// LemonSqueezy ships the event name inside `meta`, which wins over the
    /// top-level position when a sender sets both.
    pub fn event_name(&self) -> Option<&str> {
        self.meta
            .event_name
            .as_deref()
            .or(self.top_level_event_name.as_deref())
    }
}

#[derive(Debug, Deserialize)]
pub struct LemonSqueezyMeta {
    pub event_name: Option<String>,
    pub custom_data: Option<LemonSqueezyCustomData>,
}

/// Checkout custom data carried through to every webhook event.
#[derive(Debug, Deserialize)]
pub struct LemonSqueezyCustomData {
    pub user_id: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LemonSqueezyEventData {
    pub id: String,
    pub attributes: serde_json::Value,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionCreatedAttributes {
    pub product_id: Option<i64>,
    pub status: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub renews_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionUpdatedAttributes {
    pub status: Option<String>,
    pub renews_at: Option<DateTime<Utc>>,
    /// Set by LemonSqueezy when the subscription is scheduled to end, which
    /// is what drives the cancel-at-period-end flag.
    pub ends_at: Option<DateTime<Utc>>,
}

/// The closed set of billing events this service reacts to, each carrying
/// the fields its mutation needs.
#[derive(Debug)]
pub enum BillingEvent {
    SubscriptionCreated {
        subscription_id: String,
        attributes: SubscriptionCreatedAttributes,
    },
    SubscriptionUpdated(SubscriptionUpdatedAttributes),
    SubscriptionCancelled,
    OrderCreated,
    Unknown(String),
}

impl BillingEvent {
    /// Maps a wire event onto the closed set of handled kinds. Names outside
    /// the set become `Unknown` and are acknowledged without a mutation.
    pub fn parse(event_name: &str, data: LemonSqueezyEventData) -> Result<Self> {
        let event = match event_name {
            "subscription_created" => BillingEvent::SubscriptionCreated {
                subscription_id: data.id,
                attributes: serde_json::from_value(data.attributes)?,
            },
            "subscription_updated" => {
                BillingEvent::SubscriptionUpdated(serde_json::from_value(data.attributes)?)
            }
            "subscription_cancelled" => BillingEvent::SubscriptionCancelled,
            "order_created" => BillingEvent::OrderCreated,
            other => BillingEvent::Unknown(other.to_string()),
        };
        Ok(event)
    }
}
