use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result, msg};

/// Basic email format validation.
///
/// Accepts anything shaped like `local@domain.tld`:
/// - no whitespace anywhere
/// - at least one character before the "@"
/// - a domain with at least one dot that has characters on both sides
///
/// This is intentionally permissive to avoid rejecting valid but unusual
/// emails. It's not meant to be RFC 5322 compliant - just a sanity check on
/// the checkout custom data.
pub fn validate_email_format(email: &str) -> Result<()> {
    if email.chars().any(char::is_whitespace) {
        return Err(AppError::Validation(msg::INVALID_EMAIL_FORMAT.into()));
    }

    let Some((local_part, domain_part)) = email.split_once('@') else {
        return Err(AppError::Validation(msg::INVALID_EMAIL_FORMAT.into()));
    };

    if local_part.is_empty() {
        return Err(AppError::Validation(msg::INVALID_EMAIL_FORMAT.into()));
    }

    // The domain needs an interior dot: "b.c" passes, "b." and ".c" do not.
    let has_interior_dot = domain_part
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain_part.len());
    if !has_interior_dot {
        return Err(AppError::Validation(msg::INVALID_EMAIL_FORMAT.into()));
    }

    Ok(())
}

/// Row in the `users` table, keyed by the directory id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub clerk_id: String,
    pub email: String,
    pub name: String,
    pub username: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub subscription_tier: String,
    pub subscription_status: String,
    pub builds_used: i32,
    pub builds_limit: i32,
    pub remixes_used: i32,
    pub remixes_limit: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_plain_addresses() {
        for email in [
            "a@b.com",
            "user+tag@example.co.uk",
            "first.last@sub.domain.io",
            "UPPER@CASE.ORG",
        ] {
            assert!(validate_email_format(email).is_ok(), "{} should pass", email);
        }
    }

    #[test]
    fn test_rejects_shapes_without_local_at_domain_tld() {
        for email in [
            "plainaddress",
            "@no-local.com",
            "no-domain@",
            "no-dot@domain",
            "trailing-dot@domain.",
            "leading-dot@.domain",
        ] {
            assert!(validate_email_format(email).is_err(), "{} should fail", email);
        }
    }

    #[test]
    fn test_rejects_whitespace_anywhere() {
        for email in [" a@b.com", "a@b.com ", "a b@c.com", "a@b c.com", "a@b.\tcom"] {
            assert!(validate_email_format(email).is_err(), "{:?} should fail", email);
        }
    }

    #[test]
    fn test_interior_dot_rule() {
        assert!(validate_email_format("a@b.c").is_ok());
        // The second dot gives "b..c" an interior dot, so it passes the
        // shape check even though it is not a resolvable domain.
        assert!(validate_email_format("a@b..c").is_ok());
        assert!(validate_email_format("a@.").is_err());
    }
}
