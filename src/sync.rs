//! One-shot import of directory users into the store.
//!
//! Pages through the directory listing and upserts a `users` row per
//! profile, keyed on the directory id. This is a best-effort bulk load:
//! users the store rejects are logged and skipped, not fatal.

use chrono::Utc;

use crate::directory::{DirectoryUser, UserDirectory};
use crate::error::{AppError, Result};
use crate::models::{Tier, UserRecord};
use crate::store::SubscriptionStore;

/// Counts reported by an import pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncOutcome {
    pub imported: usize,
    pub skipped: usize,
}

/// Builds the `users` row for a directory profile. Users without any email
/// address cannot be imported and map to None.
pub fn user_record_from_directory(user: &DirectoryUser) -> Option<UserRecord> {
    let email = user.email.as_deref()?.to_string();

    let joined = match (user.first_name.as_deref(), user.last_name.as_deref()) {
        (Some(first), Some(last)) => format!("{} {}", first, last),
        (Some(first), None) => first.to_string(),
        (None, Some(last)) => last.to_string(),
        (None, None) => String::new(),
    };
    let name = if joined.trim().is_empty() {
        user.username.clone().unwrap_or_else(|| email.clone())
    } else {
        joined.trim().to_string()
    };

    let now = Utc::now();
    let limits = Tier::Free.limits();

    Some(UserRecord {
        clerk_id: user.id.clone(),
        email,
        name,
        username: user.username.clone(),
        avatar_url: user.image_url.clone(),
        bio: None,
        subscription_tier: Tier::Free.as_str().to_string(),
        subscription_status: "active".to_string(),
        builds_used: 0,
        builds_limit: limits.builds_limit,
        remixes_used: 0,
        remixes_limit: limits.remixes_limit,
        created_at: user.created_at.unwrap_or(now),
        updated_at: now,
    })
}

/// Imports every directory user, paging until a short page.
pub async fn sync_users(
    directory: &dyn UserDirectory,
    store: &dyn SubscriptionStore,
    page_size: u32,
) -> Result<SyncOutcome> {
    if page_size == 0 {
        return Err(AppError::Validation("page size must be positive".into()));
    }

    let mut imported = 0;
    let mut skipped = 0;
    let mut offset = 0;

    loop {
        let page = directory.list_users(page_size, offset).await?;
        let page_len = page.len();

        for user in &page {
            match user_record_from_directory(user) {
                Some(record) => match store.upsert_user(record).await {
                    Ok(()) => imported += 1,
                    Err(e) => {
                        tracing::warn!("Skipping user {}: {}", user.id, e);
                        skipped += 1;
                    }
                },
                None => {
                    tracing::warn!("Skipping user {}: no email address", user.id);
                    skipped += 1;
                }
            }
        }

        if (page_len as u32) < page_size {
            break;
        }
        offset += page_size;
    }

    tracing::info!("User import finished: {} imported, {} skipped", imported, skipped);
    Ok(SyncOutcome { imported, skipped })
}

/// Imports a single directory user by id. Unlike the bulk pass, a user that
/// cannot be imported is an error here.
pub async fn sync_one_user(
    directory: &dyn UserDirectory,
    store: &dyn SubscriptionStore,
    clerk_id: &str,
) -> Result<()> {
    let user = directory.get_user(clerk_id).await?;
    let record = user_record_from_directory(&user).ok_or_else(|| {
        AppError::Validation(format!("user {} has no email address", clerk_id))
    })?;

    let email = record.email.clone();
    store.upsert_user(record).await?;
    tracing::info!("Imported user {} ({})", clerk_id, email);
    Ok(())
}
