use axum::{Json, body::Bytes, extract::State, http::HeaderMap};
use serde::{Serialize, de::Error as _};

use crate::error::{AppError, Result, msg};
use crate::models::{NewSubscription, SubscriptionChange, validate_email_format};
use crate::payments::{BillingEvent, LemonSqueezyCustomData, LemonSqueezyWebhookEvent};
use crate::store::AppState;

#[derive(Serialize)]
pub struct WebhookResponse {
    pub success: bool,
}

/// Pulls the user identity out of `meta.custom_data`, which our checkout
/// links attach to every purchase. Events without a usable identity are
/// rejected before any store mutation.
fn validate_custom_data<'a>(
    custom_data: Option<&'a LemonSqueezyCustomData>,
    event_name: &str,
) -> Result<(&'a str, &'a str)> {
    let Some(data) = custom_data else {
        tracing::warn!("LemonSqueezy {} event carries no custom_data", event_name);
        return Err(AppError::Validation(msg::MISSING_USER_ID.into()));
    };

    let user_id = match data.user_id.as_deref() {
        None => {
            tracing::warn!("LemonSqueezy {} event carries no user_id", event_name);
            return Err(AppError::Validation(msg::MISSING_USER_ID.into()));
        }
        Some(id) => id,
    };
    if user_id.trim().is_empty() {
        tracing::warn!("LemonSqueezy {} event carries a blank user_id", event_name);
        return Err(AppError::Validation(msg::INVALID_USER_ID.into()));
    }

    let email = match data.email.as_deref() {
        None | Some("") => {
            tracing::warn!("LemonSqueezy {} event carries no email", event_name);
            return Err(AppError::Validation(msg::MISSING_EMAIL.into()));
        }
        Some(email) => email,
    };
    if let Err(e) = validate_email_format(email) {
        tracing::warn!(
            "LemonSqueezy {} event carries a malformed email {:?}",
            event_name,
            email
        );
        return Err(e);
    }

    Ok((user_id, email))
}

/// POST /webhook/lemonsqueezy
///
/// Verifies the `x-signature` HMAC over the raw body, then applies the
/// event's subscription change to the store. Events we do not react to are
/// acknowledged so LemonSqueezy stops redelivering them.
pub async fn handle_lemonsqueezy_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>> {
    let signature = headers.get("x-signature").and_then(|v| v.to_str().ok());
    if !state.verifier.verify(&body, signature)? {
        tracing::warn!("Rejected LemonSqueezy webhook: signature verification failed");
        return Err(AppError::Authentication);
    }

    let event: LemonSqueezyWebhookEvent = serde_json::from_slice(&body)?;
    let Some(event_name) = event.event_name().map(String::from) else {
        return Err(serde_json::Error::missing_field("event_name").into());
    };

    let (user_id, email) = validate_custom_data(event.meta.custom_data.as_ref(), &event_name)?;
    tracing::info!("LemonSqueezy webhook: {} for user {} ({})", event_name, user_id, email);
    let user_id = user_id.to_string();

    match BillingEvent::parse(&event_name, event.data)? {
        BillingEvent::SubscriptionCreated { subscription_id, attributes } => {
            let tier = state.product_map.resolve(attributes.product_id)?;
            state
                .store
                .upsert_subscription(NewSubscription {
                    user_id: user_id.clone(),
                    tier_id: tier.id(),
                    lemonsqueezy_subscription_id: subscription_id,
                    status: attributes.status,
                    current_period_start: attributes.created_at,
                    current_period_end: attributes.renews_at,
                    cancel_at_period_end: false,
                })
                .await?;
            tracing::info!("Stored {} subscription for user {}", tier.as_str(), user_id);
        }
        BillingEvent::SubscriptionUpdated(attributes) => {
            state
                .store
                .update_subscription(
                    &user_id,
                    SubscriptionChange {
                        status: attributes.status,
                        current_period_end: attributes.renews_at,
                        cancel_at_period_end: attributes.ends_at.is_some(),
                    },
                )
                .await?;
        }
        BillingEvent::SubscriptionCancelled => {
            state.store.delete_subscription(&user_id).await?;
        }
        BillingEvent::OrderCreated => {
            tracing::info!("Order recorded for user {}, no subscription change", user_id);
        }
        BillingEvent::Unknown(name) => {
            tracing::info!("Unhandled LemonSqueezy event: {}", name);
        }
    }

    Ok(Json(WebhookResponse { success: true }))
}
