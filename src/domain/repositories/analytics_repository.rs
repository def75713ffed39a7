//! Repository trait for aggregated performance queries.

use crate::domain::entities::ProductType;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Filter for performance aggregation. Date bounds apply to the click
/// timestamp and are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceFilter {
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub partner_id: Option<String>,
    /// Maximum number of rows; `None` returns every row.
    pub limit: Option<i64>,
}

impl PerformanceFilter {
    pub fn new(from_date: Option<DateTime<Utc>>, to_date: Option<DateTime<Utc>>) -> Self {
        Self {
            from_date,
            to_date,
            ..Self::default()
        }
    }

    pub fn with_partner(mut self, partner_id: Option<String>) -> Self {
        self.partner_id = partner_id;
        self
    }

    pub fn with_limit(mut self, limit: Option<i64>) -> Self {
        self.limit = limit;
        self
    }

    /// Returns true if a click at `at` falls inside the date bounds.
    pub fn covers(&self, at: DateTime<Utc>) -> bool {
        self.from_date.is_none_or(|from| at >= from) && self.to_date.is_none_or(|to| at <= to)
    }
}

/// Click and conversion totals for one product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPerformance {
    pub product_id: String,
    pub product_name: String,
    pub product_type: ProductType,
    pub partner_id: String,
    pub total_clicks: i64,
    pub total_conversions: i64,
    /// Conversions per click as a fraction between 0 and 1.
    pub conversion_rate: f64,
    pub revenue: f64,
}

/// Click and conversion totals for one partner across all its products.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerPerformance {
    pub partner_id: String,
    pub partner_name: String,
    pub is_active: bool,
    pub total_clicks: i64,
    pub total_conversions: i64,
    /// Conversions per click as a fraction between 0 and 1.
    pub conversion_rate: f64,
    pub revenue: f64,
    /// Revenue multiplied by the partner's commission rate, if one is set.
    pub commission: Option<f64>,
}

/// Share of clicks that converted. Zero clicks yield `0.0`.
pub fn conversion_rate(clicks: i64, conversions: i64) -> f64 {
    if clicks <= 0 {
        return 0.0;
    }
    conversions as f64 / clicks as f64
}

/// Commission owed on `revenue` at `rate` percent.
pub fn commission(revenue: f64, rate: Option<f64>) -> Option<f64> {
    rate.map(|r| revenue * r / 100.0)
}

/// Repository interface for read-only performance aggregation.
///
/// Rows are ordered by total clicks descending, then by id ascending so
/// equal rows keep a stable order. Entities without clicks in range are
/// included with zero totals.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgAnalyticsRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::memory::InMemoryStore`] - in-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalyticsRepository: Send + Sync {
    /// Aggregates clicks per product.
    async fn product_performance(
        &self,
        filter: PerformanceFilter,
    ) -> Result<Vec<ProductPerformance>, AppError>;

    /// Aggregates clicks per partner.
    async fn partner_performance(
        &self,
        filter: PerformanceFilter,
    ) -> Result<Vec<PartnerPerformance>, AppError>;
}
