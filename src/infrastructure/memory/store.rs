//! In-process implementation of every repository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::domain::entities::{
    AffiliateClick, AffiliatePartner, Conversion, ConversionOutcome, ConversionUpdate, NewClick,
    NewPartner, NewProduct, Product,
};
use crate::domain::repositories::analytics_repository::{commission, conversion_rate};
use crate::domain::repositories::{
    AnalyticsRepository, ApiToken, ClickFilter, ClickRepository, PartnerPerformance,
    PerformanceFilter, ProductPerformance, RegistryRepository, TokenRepository,
};
use crate::error::AppError;

#[derive(Default)]
struct Inner {
    partners: BTreeMap<String, AffiliatePartner>,
    products: BTreeMap<String, Product>,
    /// Insertion order doubles as the tie-breaker for equal timestamps.
    clicks: Vec<AffiliateClick>,
    click_index: HashMap<String, usize>,
    tokens: Vec<ApiToken>,
}

/// Store holding partners, products, clicks and tokens in memory.
///
/// All mutations take the write lock, so the conversion check-and-set is
/// atomic with respect to concurrent requests. Used for tests and for running
/// the service without PostgreSQL.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored clicks.
    pub async fn click_count(&self) -> usize {
        self.inner.read().await.clicks.len()
    }
}

#[async_trait]
impl RegistryRepository for InMemoryStore {
    async fn find_partner(&self, partner_id: &str) -> Result<Option<AffiliatePartner>, AppError> {
        Ok(self.inner.read().await.partners.get(partner_id).cloned())
    }

    async fn find_product(&self, product_id: &str) -> Result<Option<Product>, AppError> {
        Ok(self.inner.read().await.products.get(product_id).cloned())
    }

    async fn list_partners(&self) -> Result<Vec<AffiliatePartner>, AppError> {
        Ok(self.inner.read().await.partners.values().cloned().collect())
    }

    async fn list_products(&self, partner_id: Option<String>) -> Result<Vec<Product>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .products
            .values()
            .filter(|p| partner_id.as_ref().is_none_or(|id| *id == p.partner_id))
            .cloned()
            .collect())
    }

    async fn create_partner(&self, new_partner: NewPartner) -> Result<AffiliatePartner, AppError> {
        let mut inner = self.inner.write().await;
        if inner.partners.contains_key(&new_partner.id) {
            return Err(AppError::conflict(
                "Partner already exists",
                json!({ "partner_id": new_partner.id }),
            ));
        }

        let partner = AffiliatePartner {
            id: new_partner.id,
            name: new_partner.name,
            website: new_partner.website,
            commission_rate: new_partner.commission_rate,
            is_active: new_partner.is_active,
            product_ids: Vec::new(),
            created_at: Utc::now(),
        };
        inner.partners.insert(partner.id.clone(), partner.clone());

        Ok(partner)
    }

    async fn create_product(&self, new_product: NewProduct) -> Result<Product, AppError> {
        let mut inner = self.inner.write().await;
        if inner.products.contains_key(&new_product.id) {
            return Err(AppError::conflict(
                "Product already exists",
                json!({ "product_id": new_product.id }),
            ));
        }

        let Some(partner) = inner.partners.get_mut(&new_product.partner_id) else {
            return Err(AppError::not_found(
                "Partner not found",
                json!({ "partner_id": new_product.partner_id }),
            ));
        };
        partner.product_ids.push(new_product.id.clone());
        partner.product_ids.sort();

        let product = Product {
            id: new_product.id,
            partner_id: new_product.partner_id,
            name: new_product.name,
            product_type: new_product.product_type,
            application_url: new_product.application_url,
            is_active: new_product.is_active,
            created_at: Utc::now(),
        };
        inner.products.insert(product.id.clone(), product.clone());

        Ok(product)
    }
}

#[async_trait]
impl ClickRepository for InMemoryStore {
    async fn create(&self, new_click: NewClick) -> Result<AffiliateClick, AppError> {
        let mut inner = self.inner.write().await;
        if inner.click_index.contains_key(&new_click.tracking_id) {
            return Err(AppError::conflict(
                "Unique constraint violation",
                json!({ "constraint": "affiliate_clicks_tracking_id_key" }),
            ));
        }

        let click = AffiliateClick::from_new(new_click);
        let position = inner.clicks.len();
        inner.click_index.insert(click.tracking_id.clone(), position);
        inner.clicks.push(click.clone());

        Ok(click)
    }

    async fn find_by_tracking_id(
        &self,
        tracking_id: &str,
    ) -> Result<Option<AffiliateClick>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .click_index
            .get(tracking_id)
            .map(|&i| inner.clicks[i].clone()))
    }

    async fn record_conversion(
        &self,
        update: ConversionUpdate,
    ) -> Result<ConversionOutcome, AppError> {
        let mut inner = self.inner.write().await;
        let Some(&position) = inner.click_index.get(&update.tracking_id) else {
            return Ok(ConversionOutcome::NotFound);
        };

        let click = &mut inner.clicks[position];
        if click.converted {
            return Ok(ConversionOutcome::AlreadyConverted);
        }
        if click.created_at < update.window_start {
            return Ok(ConversionOutcome::WindowExpired {
                clicked_at: click.created_at,
            });
        }

        click.converted = true;
        click.conversion = Some(Conversion {
            conversion_type: update.conversion_type,
            value: update.value,
            converted_at: update.converted_at.max(click.created_at),
            metadata: update.metadata,
        });

        Ok(ConversionOutcome::Recorded(Box::new(click.clone())))
    }

    async fn count_by_ip_between(
        &self,
        ip_address: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let inner = self.inner.read().await;
        let count = inner
            .clicks
            .iter()
            .filter(|c| c.ip_address == ip_address && c.created_at >= from && c.created_at <= to)
            .count();

        Ok(count as i64)
    }

    async fn count_by_session_between(
        &self,
        session_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let inner = self.inner.read().await;
        let count = inner
            .clicks
            .iter()
            .filter(|c| {
                c.session_id.as_deref() == Some(session_id)
                    && c.created_at >= from
                    && c.created_at <= to
            })
            .count();

        Ok(count as i64)
    }

    async fn list(&self, filter: ClickFilter) -> Result<Vec<AffiliateClick>, AppError> {
        let inner = self.inner.read().await;
        let mut matching: Vec<&AffiliateClick> = inner
            .clicks
            .iter()
            .filter(|c| filter.matches(c))
            .filter(|c| filter.after.as_ref().is_none_or(|cursor| cursor.precedes(c)))
            .collect();
        matching.sort_by(|a, b| {
            (b.created_at, b.tracking_id.as_str()).cmp(&(a.created_at, a.tracking_id.as_str()))
        });

        Ok(matching
            .into_iter()
            .skip(filter.offset.max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: ClickFilter) -> Result<i64, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.clicks.iter().filter(|c| filter.matches(c)).count() as i64)
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[derive(Default)]
struct Totals {
    clicks: i64,
    conversions: i64,
    revenue: f64,
}

impl Totals {
    fn add(&mut self, click: &AffiliateClick) {
        self.clicks += 1;
        if click.converted {
            self.conversions += 1;
            self.revenue += click.revenue();
        }
    }
}

fn truncate<T>(mut rows: Vec<T>, limit: Option<i64>) -> Vec<T> {
    if let Some(limit) = limit {
        rows.truncate(limit.max(0) as usize);
    }
    rows
}

#[async_trait]
impl AnalyticsRepository for InMemoryStore {
    async fn product_performance(
        &self,
        filter: PerformanceFilter,
    ) -> Result<Vec<ProductPerformance>, AppError> {
        let inner = self.inner.read().await;
        let mut totals: HashMap<&str, Totals> = HashMap::new();
        for click in inner.clicks.iter().filter(|c| filter.covers(c.created_at)) {
            totals.entry(&click.product_id).or_default().add(click);
        }

        let mut rows: Vec<ProductPerformance> = inner
            .products
            .values()
            .filter(|p| filter.partner_id.as_ref().is_none_or(|id| *id == p.partner_id))
            .map(|p| {
                let t = totals.remove(p.id.as_str()).unwrap_or_default();
                ProductPerformance {
                    product_id: p.id.clone(),
                    product_name: p.name.clone(),
                    product_type: p.product_type,
                    partner_id: p.partner_id.clone(),
                    total_clicks: t.clicks,
                    total_conversions: t.conversions,
                    conversion_rate: conversion_rate(t.clicks, t.conversions),
                    revenue: t.revenue,
                }
            })
            .collect();
        // BTreeMap iteration is already ordered by id; the stable sort keeps it for ties.
        rows.sort_by(|a, b| b.total_clicks.cmp(&a.total_clicks));

        Ok(truncate(rows, filter.limit))
    }

    async fn partner_performance(
        &self,
        filter: PerformanceFilter,
    ) -> Result<Vec<PartnerPerformance>, AppError> {
        let inner = self.inner.read().await;
        let mut totals: HashMap<&str, Totals> = HashMap::new();
        for click in inner.clicks.iter().filter(|c| filter.covers(c.created_at)) {
            totals.entry(&click.partner_id).or_default().add(click);
        }

        let mut rows: Vec<PartnerPerformance> = inner
            .partners
            .values()
            .filter(|p| filter.partner_id.as_ref().is_none_or(|id| *id == p.id))
            .map(|p| {
                let t = totals.remove(p.id.as_str()).unwrap_or_default();
                PartnerPerformance {
                    partner_id: p.id.clone(),
                    partner_name: p.name.clone(),
                    is_active: p.is_active,
                    total_clicks: t.clicks,
                    total_conversions: t.conversions,
                    conversion_rate: conversion_rate(t.clicks, t.conversions),
                    revenue: t.revenue,
                    commission: commission(t.revenue, p.commission_rate),
                }
            })
            .collect();
        rows.sort_by(|a, b| b.total_clicks.cmp(&a.total_clicks));

        Ok(truncate(rows, filter.limit))
    }
}

#[async_trait]
impl TokenRepository for InMemoryStore {
    async fn validate_token(&self, token_hash: &str) -> Result<bool, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .tokens
            .iter()
            .any(|t| t.token_hash == token_hash && t.revoked_at.is_none()))
    }

    async fn update_last_used(&self, token_hash: &str) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        if let Some(token) = inner
            .tokens
            .iter_mut()
            .find(|t| t.token_hash == token_hash && t.revoked_at.is_none())
        {
            token.last_used_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn create_token(&self, name: &str, token_hash: &str) -> Result<ApiToken, AppError> {
        let mut inner = self.inner.write().await;
        if inner
            .tokens
            .iter()
            .any(|t| t.name == name || t.token_hash == token_hash)
        {
            return Err(AppError::conflict(
                "Token already exists",
                json!({ "name": name }),
            ));
        }

        let token = ApiToken {
            id: inner.tokens.len() as i64 + 1,
            name: name.to_string(),
            token_hash: token_hash.to_string(),
            created_at: Utc::now(),
            last_used_at: None,
            revoked_at: None,
        };
        inner.tokens.push(token.clone());

        Ok(token)
    }

    async fn list_tokens(&self) -> Result<Vec<ApiToken>, AppError> {
        Ok(self.inner.read().await.tokens.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ApiToken>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.tokens.iter().find(|t| t.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ApiToken>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.tokens.iter().find(|t| t.name == name).cloned())
    }

    async fn revoke_token(&self, id: i64) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let token = inner
            .tokens
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| AppError::not_found("Token not found", json!({ "id": id })))?;
        token.revoked_at.get_or_insert_with(Utc::now);

        Ok(())
    }
}
