use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{NewSubscription, SubscriptionChange, UserRecord};

use super::SubscriptionStore;

/// Upper bound on any single store call. The billing provider retries on
/// 5xx, so failing fast beats hanging a delivery.
const STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Supabase REST (PostgREST) client using the service-role credential.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseStore {
    pub fn new(base_url: &str, service_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(STORE_TIMEOUT)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build store HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    async fn check(response: reqwest::Response, operation: &str) -> Result<()> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Store(format!(
                "{} returned {}: {}",
                operation, status, error_text
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for SupabaseStore {
    async fn upsert_subscription(&self, subscription: NewSubscription) -> Result<()> {
        let response = self
            .client
            .post(self.table_url("user_subscriptions"))
            .query(&[("on_conflict", "user_id")])
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&subscription)
            .send()
            .await
            .map_err(|e| AppError::Store(format!("upsert user_subscriptions failed: {}", e)))?;

        Self::check(response, "upsert user_subscriptions").await
    }

    async fn update_subscription(&self, user_id: &str, change: SubscriptionChange) -> Result<()> {
        let response = self
            .client
            .patch(self.table_url("user_subscriptions"))
            .query(&[("user_id", format!("eq.{}", user_id))])
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .header("Prefer", "return=minimal")
            .json(&change)
            .send()
            .await
            .map_err(|e| AppError::Store(format!("update user_subscriptions failed: {}", e)))?;

        Self::check(response, "update user_subscriptions").await
    }

    async fn delete_subscription(&self, user_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.table_url("user_subscriptions"))
            .query(&[("user_id", format!("eq.{}", user_id))])
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .header("Prefer", "return=minimal")
            .send()
            .await
            .map_err(|e| AppError::Store(format!("delete user_subscriptions failed: {}", e)))?;

        Self::check(response, "delete user_subscriptions").await
    }

    async fn upsert_user(&self, user: UserRecord) -> Result<()> {
        let response = self
            .client
            .post(self.table_url("users"))
            .query(&[("on_conflict", "clerk_id")])
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&user)
            .send()
            .await
            .map_err(|e| AppError::Store(format!("upsert users failed: {}", e)))?;

        Self::check(response, "upsert users").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url_handles_trailing_slash() {
        let store = SupabaseStore::new("https://example.supabase.co/", "key").unwrap();

        assert_eq!(
            store.table_url("user_subscriptions"),
            "https://example.supabase.co/rest/v1/user_subscriptions"
        );
    }
}
