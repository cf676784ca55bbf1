//! Test utilities and fixtures for Tiersync integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use tower::ServiceExt;

pub use tiersync::directory::{DirectoryUser, UserDirectory};
pub use tiersync::error::{AppError, Result};
pub use tiersync::handlers;
pub use tiersync::models::*;
pub use tiersync::payments::WebhookVerifier;
pub use tiersync::store::{AppState, SubscriptionStore};

pub const TEST_WEBHOOK_SECRET: &str = "ls-test-secret";

/// Product map used by every test app: two paid products.
pub fn test_product_map() -> ProductMap {
    [(889001, Tier::Basic), (889002, Tier::Pro)].into_iter().collect()
}

/// In-memory store double recording what the handlers wrote.
#[derive(Default)]
pub struct MemoryStore {
    subscriptions: Mutex<HashMap<String, NewSubscription>>,
    users: Mutex<HashMap<String, UserRecord>>,
    fail: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every following store call fail, as if Supabase were down.
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn subscription(&self, user_id: &str) -> Option<NewSubscription> {
        self.subscriptions.lock().unwrap().get(user_id).cloned()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().unwrap().len()
    }

    pub fn user(&self, clerk_id: &str) -> Option<UserRecord> {
        self.users.lock().unwrap().get(clerk_id).cloned()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    fn check_failing(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Store("simulated store outage".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for MemoryStore {
    async fn upsert_subscription(&self, subscription: NewSubscription) -> Result<()> {
        self.check_failing()?;
        self.subscriptions
            .lock()
            .unwrap()
            .insert(subscription.user_id.clone(), subscription);
        Ok(())
    }

    async fn update_subscription(&self, user_id: &str, change: SubscriptionChange) -> Result<()> {
        self.check_failing()?;
        // Zero matching rows is fine, like a PostgREST PATCH
        if let Some(row) = self.subscriptions.lock().unwrap().get_mut(user_id) {
            row.status = change.status;
            row.current_period_end = change.current_period_end;
            row.cancel_at_period_end = change.cancel_at_period_end;
        }
        Ok(())
    }

    async fn delete_subscription(&self, user_id: &str) -> Result<()> {
        self.check_failing()?;
        self.subscriptions.lock().unwrap().remove(user_id);
        Ok(())
    }

    async fn upsert_user(&self, user: UserRecord) -> Result<()> {
        self.check_failing()?;
        self.users.lock().unwrap().insert(user.clerk_id.clone(), user);
        Ok(())
    }
}

/// Directory double serving a fixed user list.
pub struct StaticDirectory {
    pub users: Vec<DirectoryUser>,
}

#[async_trait]
impl UserDirectory for StaticDirectory {
    async fn list_users(&self, limit: u32, offset: u32) -> Result<Vec<DirectoryUser>> {
        let start = (offset as usize).min(self.users.len());
        let end = (start + limit as usize).min(self.users.len());
        Ok(self.users[start..end].to_vec())
    }

    async fn get_user(&self, user_id: &str) -> Result<DirectoryUser> {
        self.users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or_else(|| AppError::Directory(format!("no such user: {}", user_id)))
    }
}

/// Directory profile fixture with a full name and no avatar.
pub fn directory_user(id: &str, email: Option<&str>) -> DirectoryUser {
    DirectoryUser {
        id: id.to_string(),
        email: email.map(String::from),
        first_name: Some("Test".to_string()),
        last_name: Some("User".to_string()),
        username: None,
        image_url: None,
        created_at: None,
    }
}

/// Build the full application router around a MemoryStore. `secret` of None
/// runs the webhook endpoint in open (unverified) mode.
pub fn test_app(secret: Option<&str>) -> (Router, Arc<MemoryStore>) {
    let store = MemoryStore::new();
    let state = AppState {
        store: store.clone(),
        verifier: WebhookVerifier::new(secret.map(String::from)),
        product_map: test_product_map(),
    };

    let app = Router::new()
        .merge(handlers::public::router())
        .merge(handlers::webhooks::router())
        .with_state(state);

    (app, store)
}

pub fn compute_lemonsqueezy_signature(payload: &[u8], secret: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    type HmacSha256 = Hmac<Sha256>;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(payload);
    hex::encode(mac.finalize().into_bytes())
}

/// custom_data blob as our checkout links attach it.
pub fn identity(user_id: &str, email: &str) -> serde_json::Value {
    serde_json::json!({ "user_id": user_id, "email": email })
}

/// Attributes of a subscription_created event for a given product.
pub fn created_attributes(product_id: i64) -> serde_json::Value {
    serde_json::json!({
        "product_id": product_id,
        "status": "active",
        "created_at": "2025-05-01T00:00:00Z",
        "renews_at": "2025-06-01T00:00:00Z",
    })
}

pub fn webhook_payload(
    event_name: &str,
    custom_data: serde_json::Value,
    attributes: serde_json::Value,
) -> String {
    serde_json::json!({
        "meta": { "event_name": event_name, "custom_data": custom_data },
        "data": { "id": "sub_991", "attributes": attributes },
    })
    .to_string()
}

/// POST the payload to the webhook endpoint, signing it when a signature
/// value is given.
pub async fn post_webhook(app: Router, payload: &str, signature: Option<&str>) -> Response {
    let mut request = Request::builder()
        .method("POST")
        .uri("/webhook/lemonsqueezy")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        request = request.header("x-signature", signature);
    }

    app.oneshot(request.body(Body::from(payload.to_string())).unwrap())
        .await
        .unwrap()
}

/// POST the payload with a signature computed from TEST_WEBHOOK_SECRET.
pub async fn post_signed_webhook(app: Router, payload: &str) -> Response {
    let signature = compute_lemonsqueezy_signature(payload.as_bytes(), TEST_WEBHOOK_SECRET);
    post_webhook(app, payload, Some(&signature)).await
}

pub async fn response_json(response: Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).expect("Response should be valid JSON")
}
