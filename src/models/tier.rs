use std::collections::HashMap;

use crate::error::{AppError, Result};

/// Subscription tiers, ordered by price. The integer ids are stored in the
/// `tier_id` column and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Free,
    Basic,
    Pro,
    ProPlus,
    Enterprise,
}

/// Usage limits granted by a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierLimits {
    pub builds_limit: i32,
    pub remixes_limit: i32,
}

impl Tier {
    pub fn id(&self) -> i32 {
        match self {
            Tier::Free => 0,
            Tier::Basic => 1,
            Tier::Pro => 2,
            Tier::ProPlus => 3,
            Tier::Enterprise => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Basic => "basic",
            Tier::Pro => "pro",
            Tier::ProPlus => "pro_plus",
            Tier::Enterprise => "enterprise",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "free" => Some(Tier::Free),
            "basic" => Some(Tier::Basic),
            "pro" => Some(Tier::Pro),
            "pro_plus" => Some(Tier::ProPlus),
            "enterprise" => Some(Tier::Enterprise),
            _ => None,
        }
    }

    pub fn limits(&self) -> TierLimits {
        match self {
            Tier::Free => TierLimits { builds_limit: 5, remixes_limit: 3 },
            Tier::Basic => TierLimits { builds_limit: 50, remixes_limit: 25 },
            Tier::Pro => TierLimits { builds_limit: 200, remixes_limit: 100 },
            Tier::ProPlus => TierLimits { builds_limit: 500, remixes_limit: 250 },
            Tier::Enterprise => TierLimits { builds_limit: 1000, remixes_limit: 500 },
        }
    }
}

/// Maps LemonSqueezy product ids to tiers, sourced from
/// `LEMONSQUEEZY_PRODUCT_MAP` (comma list of `product_id:tier_name`).
#[derive(Debug, Clone, Default)]
pub struct ProductMap {
    tiers: HashMap<i64, Tier>,
}

impl ProductMap {
    pub fn parse(raw: &str) -> Result<Self> {
        let mut tiers = HashMap::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((product_id, tier_name)) = entry.split_once(':') else {
                return Err(AppError::Config(format!(
                    "Malformed product map entry: {}",
                    entry
                )));
            };
            let product_id: i64 = product_id.trim().parse().map_err(|_| {
                AppError::Config(format!("Invalid product id in product map: {}", product_id))
            })?;
            let tier = Tier::from_str(tier_name.trim()).ok_or_else(|| {
                AppError::Config(format!("Unknown tier in product map: {}", tier_name))
            })?;
            tiers.insert(product_id, tier);
        }
        Ok(Self { tiers })
    }

    /// Resolves a billing product id to a tier. Unknown and absent product
    /// ids are hard errors, never defaulted.
    pub fn resolve(&self, product_id: Option<i64>) -> Result<Tier> {
        let id = product_id
            .ok_or_else(|| AppError::Mapping("event carries no product_id".into()))?;
        self.tiers
            .get(&id)
            .copied()
            .ok_or_else(|| AppError::Mapping(format!("no tier mapped for product {}", id)))
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

impl FromIterator<(i64, Tier)> for ProductMap {
    fn from_iter<I: IntoIterator<Item = (i64, Tier)>>(iter: I) -> Self {
        Self {
            tiers: iter.into_iter().collect(),
        }
    }
}
