mod supabase;

pub use supabase::SupabaseStore;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{NewSubscription, ProductMap, SubscriptionChange, UserRecord};
use crate::payments::WebhookVerifier;

/// Mutations this service performs against the backing store. Concrete
/// clients are constructed at the process entry point and injected, which
/// keeps handlers free of globals and lets tests swap in doubles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Insert-or-overwrite on the `user_id` unique key.
    async fn upsert_subscription(&self, subscription: NewSubscription) -> Result<()>;

    /// Applies a partial change to matching rows. Zero matched rows is not
    /// an error.
    async fn update_subscription(&self, user_id: &str, change: SubscriptionChange) -> Result<()>;

    /// Removes the subscription row if one exists. The only deletion in the
    /// system; a future move to status-flag cancellation touches this call
    /// site alone.
    async fn delete_subscription(&self, user_id: &str) -> Result<()>;

    /// Insert-or-overwrite on the `clerk_id` unique key.
    async fn upsert_user(&self, user: UserRecord) -> Result<()>;
}

/// Application state shared across request handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SubscriptionStore>,
    pub verifier: WebhookVerifier,
    pub product_map: ProductMap,
}
