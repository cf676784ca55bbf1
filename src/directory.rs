//! Clerk directory API client.
//!
//! The directory is the service of record for user identity. This client
//! covers the two calls the import commands need: a paged user listing and
//! a single-user lookup.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AppError, Result};

const DIRECTORY_TIMEOUT: Duration = Duration::from_secs(5);

/// User profile fields consumed from the directory, with the primary email
/// already resolved.
#[derive(Debug, Clone)]
pub struct DirectoryUser {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub image_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

/// Read access to the user directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn list_users(&self, limit: u32, offset: u32) -> Result<Vec<DirectoryUser>>;
    async fn get_user(&self, user_id: &str) -> Result<DirectoryUser>;
}

#[derive(Debug, Deserialize)]
struct ClerkUser {
    id: String,
    first_name: Option<String>,
    last_name: Option<String>,
    username: Option<String>,
    image_url: Option<String>,
    primary_email_address_id: Option<String>,
    #[serde(default)]
    email_addresses: Vec<ClerkEmailAddress>,
    /// Milliseconds since the Unix epoch.
    created_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ClerkEmailAddress {
    id: String,
    email_address: String,
}

impl ClerkUser {
    fn into_directory_user(self) -> DirectoryUser {
        // Prefer the address Clerk marks primary, fall back to the first one.
        let email = match &self.primary_email_address_id {
            Some(primary_id) => self
                .email_addresses
                .iter()
                .find(|e| &e.id == primary_id)
                .or_else(|| self.email_addresses.first()),
            None => self.email_addresses.first(),
        }
        .map(|e| e.email_address.clone());

        let created_at = self
            .created_at
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single());

        DirectoryUser {
            id: self.id,
            email,
            first_name: self.first_name,
            last_name: self.last_name,
            username: self.username,
            image_url: self.image_url,
            created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClerkClient {
    client: Client,
    secret_key: String,
}

impl ClerkClient {
    pub fn new(secret_key: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(DIRECTORY_TIMEOUT)
            .build()
            .map_err(|e| {
                AppError::Config(format!("Failed to build directory HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            secret_key: secret_key.to_string(),
        })
    }
}

#[async_trait]
impl UserDirectory for ClerkClient {
    async fn list_users(&self, limit: u32, offset: u32) -> Result<Vec<DirectoryUser>> {
        let response = self
            .client
            .get("https://api.clerk.com/v1/users")
            .query(&[("limit", limit), ("offset", offset)])
            .header("Authorization", format!("Bearer {}", self.secret_key))
            .send()
            .await
            .map_err(|e| AppError::Directory(format!("list users failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Directory(format!(
                "list users returned {}: {}",
                status, error_text
            )));
        }

        let users: Vec<ClerkUser> = response
            .json()
            .await
            .map_err(|e| AppError::Directory(format!("Failed to parse user listing: {}", e)))?;

        Ok(users.into_iter().map(ClerkUser::into_directory_user).collect())
    }

    async fn get_user(&self, user_id: &str) -> Result<DirectoryUser> {
        let response = self
            .client
            .get(format!("https://api.clerk.com/v1/users/{}", user_id))
            .header("Authorization", format!("Bearer {}", self.secret_key))
            .send()
            .await
            .map_err(|e| AppError::Directory(format!("get user {} failed: {}", user_id, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Directory(format!(
                "get user {} returned {}: {}",
                user_id, status, error_text
            )));
        }

        let user: ClerkUser = response
            .json()
            .await
            .map_err(|e| AppError::Directory(format!("Failed to parse user {}: {}", user_id, e)))?;

        Ok(user.into_directory_user())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clerk_user(primary: Option<&str>, addresses: &[(&str, &str)]) -> ClerkUser {
        ClerkUser {
            id: "user_1".to_string(),
            first_name: None,
            last_name: None,
            username: None,
            image_url: None,
            primary_email_address_id: primary.map(String::from),
            email_addresses: addresses
                .iter()
                .map(|(id, email)| ClerkEmailAddress {
                    id: id.to_string(),
                    email_address: email.to_string(),
                })
                .collect(),
            created_at: Some(1_717_200_000_000),
        }
    }

    #[test]
    fn test_primary_email_is_preferred() {
        let user = clerk_user(
            Some("idn_2"),
            &[("idn_1", "old@example.com"), ("idn_2", "current@example.com")],
        );

        let mapped = user.into_directory_user();

        assert_eq!(mapped.email.as_deref(), Some("current@example.com"));
    }

    #[test]
    fn test_falls_back_to_first_address() {
        let dangling = clerk_user(Some("idn_9"), &[("idn_1", "only@example.com")]);
        assert_eq!(
            dangling.into_directory_user().email.as_deref(),
            Some("only@example.com")
        );

        let no_primary = clerk_user(None, &[("idn_1", "first@example.com")]);
        assert_eq!(
            no_primary.into_directory_user().email.as_deref(),
            Some("first@example.com")
        );
    }

    #[test]
    fn test_no_addresses_maps_to_none() {
        let user = clerk_user(None, &[]);

        let mapped = user.into_directory_user();

        assert!(mapped.email.is_none());
        assert_eq!(
            mapped.created_at.unwrap().to_rfc3339(),
            "2024-06-01T00:00:00+00:00"
        );
    }
}
