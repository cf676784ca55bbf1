use std::env;

use crate::error::{AppError, Result};
use crate::models::ProductMap;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub supabase_url: String,
    pub supabase_service_key: String,
    /// Shared secret for webhook signatures. None means verification is
    /// skipped, a development-only mode that logs a warning per request.
    pub lemonsqueezy_webhook_secret: Option<String>,
    pub product_map: ProductMap,
    /// Directory API credential, required only for the user import commands.
    pub clerk_secret_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = var("HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port: u16 = var("PORT").and_then(|p| p.parse().ok()).unwrap_or(3000);

        let supabase_url = var("SUPABASE_URL")
            .ok_or_else(|| AppError::Config("SUPABASE_URL is not set".into()))?;
        let supabase_service_key = var("SUPABASE_SERVICE_ROLE_KEY")
            .ok_or_else(|| AppError::Config("SUPABASE_SERVICE_ROLE_KEY is not set".into()))?;

        let product_map = match var("LEMONSQUEEZY_PRODUCT_MAP") {
            Some(raw) => ProductMap::parse(&raw)?,
            None => ProductMap::default(),
        };

        Ok(Self {
            host,
            port,
            supabase_url,
            supabase_service_key,
            lemonsqueezy_webhook_secret: var("LEMONSQUEEZY_WEBHOOK_SECRET"),
            product_map,
            clerk_secret_key: var("CLERK_SECRET_KEY"),
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
