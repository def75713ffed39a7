//! Affiliate partner entity owned by the registry.

use chrono::{DateTime, Utc};

/// An affiliate partner (bank, broker, card issuer) whose products are promoted.
#[derive(Debug, Clone, PartialEq)]
pub struct AffiliatePartner {
    pub id: String,
    pub name: String,
    pub website: Option<String>,
    /// Commission in percent of the conversion value.
    pub commission_rate: Option<f64>,
    pub is_active: bool,
    /// Ids of the products this partner owns.
    pub product_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl AffiliatePartner {
    /// Returns true if the partner owns the given product.
    pub fn owns(&self, product_id: &str) -> bool {
        self.product_ids.iter().any(|id| id == product_id)
    }
}

/// Input data for registering a partner.
#[derive(Debug, Clone)]
pub struct NewPartner {
    pub id: String,
    pub name: String,
    pub website: Option<String>,
    pub commission_rate: Option<f64>,
    pub is_active: bool,
}
