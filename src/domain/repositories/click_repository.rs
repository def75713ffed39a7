//! Repository trait for the click store.

use crate::domain::entities::{AffiliateClick, ConversionOutcome, ConversionUpdate, NewClick};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Position in the newest-first click ordering.
///
/// A filter carrying a cursor only returns clicks strictly after it, so
/// rows written while a scan is in progress never shift later batches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickCursor {
    pub created_at: DateTime<Utc>,
    pub tracking_id: String,
}

impl ClickCursor {
    /// Cursor positioned at `click`.
    pub fn at(click: &AffiliateClick) -> Self {
        Self {
            created_at: click.created_at,
            tracking_id: click.tracking_id.clone(),
        }
    }

    /// Returns true if `click` sorts after this cursor.
    pub fn precedes(&self, click: &AffiliateClick) -> bool {
        (click.created_at, click.tracking_id.as_str())
            < (self.created_at, self.tracking_id.as_str())
    }
}

/// Filter criteria for click history queries.
///
/// Supports partner/product scoping, date range, conversion state and
/// pagination. Date bounds are inclusive. Results are ordered by
/// `(created_at, tracking_id)` descending.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickFilter {
    pub partner_id: Option<String>,
    pub product_id: Option<String>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub converted: Option<bool>,
    /// Keyset position; applied by `list` only.
    pub after: Option<ClickCursor>,
    pub offset: i64,
    pub limit: i64,
}

impl ClickFilter {
    /// Creates a new filter with pagination parameters.
    pub fn new(offset: i64, limit: i64) -> Self {
        Self {
            partner_id: None,
            product_id: None,
            from_date: None,
            to_date: None,
            converted: None,
            after: None,
            offset,
            limit,
        }
    }

    /// Restricts the query to one partner.
    pub fn with_partner(mut self, partner_id: Option<String>) -> Self {
        self.partner_id = partner_id;
        self
    }

    /// Restricts the query to one product.
    pub fn with_product(mut self, product_id: Option<String>) -> Self {
        self.product_id = product_id;
        self
    }

    /// Adds date range filtering on the click timestamp.
    pub fn with_date_range(
        mut self,
        from_date: Option<DateTime<Utc>>,
        to_date: Option<DateTime<Utc>>,
    ) -> Self {
        self.from_date = from_date;
        self.to_date = to_date;
        self
    }

    /// Restricts the query to converted or unconverted clicks.
    pub fn with_converted(mut self, converted: Option<bool>) -> Self {
        self.converted = converted;
        self
    }

    /// Continues a newest-first scan after `cursor`.
    pub fn after(mut self, cursor: Option<ClickCursor>) -> Self {
        self.after = cursor;
        self
    }

    /// Returns true if `click` satisfies every criterion except pagination.
    pub fn matches(&self, click: &AffiliateClick) -> bool {
        self.partner_id
            .as_ref()
            .is_none_or(|p| *p == click.partner_id)
            && self
                .product_id
                .as_ref()
                .is_none_or(|p| *p == click.product_id)
            && self.from_date.is_none_or(|from| click.created_at >= from)
            && self.to_date.is_none_or(|to| click.created_at <= to)
            && self.converted.is_none_or(|c| c == click.converted)
    }
}

/// Repository interface for tracked clicks.
///
/// The store exclusively owns click records. Clicks are never deleted; the
/// only mutation is the conditional conversion write.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgClickRepository`] - PostgreSQL implementation
/// - [`crate::infrastructure::memory::InMemoryStore`] - in-process implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Persists a new click.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the tracking id already exists.
    /// Returns [`AppError::TransientStore`] if the store is unreachable.
    async fn create(&self, new_click: NewClick) -> Result<AffiliateClick, AppError>;

    /// Finds a click by its tracking id, reading current state.
    async fn find_by_tracking_id(
        &self,
        tracking_id: &str,
    ) -> Result<Option<AffiliateClick>, AppError>;

    /// Attributes a conversion to a click in one atomic step.
    ///
    /// The write succeeds only if the click exists, is unconverted and was
    /// created at or after `update.window_start`. Otherwise the outcome reports
    /// which condition failed. Concurrent calls for one tracking id yield at
    /// most one [`ConversionOutcome::Recorded`].
    async fn record_conversion(
        &self,
        update: ConversionUpdate,
    ) -> Result<ConversionOutcome, AppError>;

    /// Counts clicks from `ip_address` with a timestamp in `[from, to]`.
    async fn count_by_ip_between(
        &self,
        ip_address: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, AppError>;

    /// Counts clicks from `session_id` with a timestamp in `[from, to]`.
    async fn count_by_session_between(
        &self,
        session_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, AppError>;

    /// Lists clicks matching the filter, newest first.
    async fn list(&self, filter: ClickFilter) -> Result<Vec<AffiliateClick>, AppError>;

    /// Counts clicks matching the filter, ignoring pagination.
    async fn count(&self, filter: ClickFilter) -> Result<i64, AppError>;

    /// Verifies the store is reachable.
    async fn ping(&self) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CampaignParams, NewClick};
    use chrono::TimeDelta;

    fn click(partner: &str, at: DateTime<Utc>) -> AffiliateClick {
        AffiliateClick::from_new(NewClick {
            tracking_id: "t".to_string(),
            partner_id: partner.to_string(),
            product_id: "X1".to_string(),
            created_at: at,
            ip_address: "1.1.1.1".to_string(),
            user_agent: "UA".to_string(),
            referrer: None,
            session_id: None,
            user_id: None,
            campaign: CampaignParams::default(),
        })
    }

    #[test]
    fn test_filter_builder() {
        let now = Utc::now();
        let filter = ClickFilter::new(20, 10)
            .with_partner(Some("P1".to_string()))
            .with_date_range(Some(now), None)
            .with_converted(Some(true));

        assert_eq!(filter.offset, 20);
        assert_eq!(filter.limit, 10);
        assert_eq!(filter.partner_id.as_deref(), Some("P1"));
        assert_eq!(filter.from_date, Some(now));
        assert_eq!(filter.converted, Some(true));
    }

    #[test]
    fn test_filter_matches() {
        let now = Utc::now();
        let c = click("P1", now);

        assert!(ClickFilter::new(0, 10).matches(&c));
        assert!(
            ClickFilter::new(0, 10)
                .with_partner(Some("P1".to_string()))
                .matches(&c)
        );
        assert!(
            !ClickFilter::new(0, 10)
                .with_partner(Some("P2".to_string()))
                .matches(&c)
        );
        assert!(
            ClickFilter::new(0, 10)
                .with_date_range(Some(now), Some(now))
                .matches(&c)
        );
        assert!(
            !ClickFilter::new(0, 10)
                .with_date_range(Some(now + TimeDelta::seconds(1)), None)
                .matches(&c)
        );
        assert!(
            !ClickFilter::new(0, 10)
                .with_converted(Some(true))
                .matches(&c)
        );
    }
}
