//! Click history, performance reports and CSV exports.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;

use crate::domain::entities::AffiliateClick;
use crate::domain::repositories::{
    AnalyticsRepository, ClickCursor, ClickFilter, ClickRepository, PartnerPerformance, PerformanceFilter,
    ProductPerformance,
};
use crate::error::{AppError, FieldErrors};
use crate::utils::csv_export::{ClickCsvRow, ConversionCsvRow, ProductCsvRow, to_csv};
use crate::utils::tracking_id::is_valid_identifier;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const DEFAULT_PERFORMANCE_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

/// Clicks fetched per round trip while building an export.
const EXPORT_BATCH: i64 = 1000;

/// Inclusive date range on the click timestamp. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    fn check(&self, errors: &mut FieldErrors) {
        if let (Some(start), Some(end)) = (self.start, self.end)
            && start > end
        {
            errors.add("startDate", "must not be after endDate");
        }
    }
}

/// Export content selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    /// One row per click.
    Clicks,
    /// One row per converted click.
    Conversions,
    /// One row per product performance summary.
    Products,
}

impl ExportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportKind::Clicks => "clicks",
            ExportKind::Conversions => "conversions",
            ExportKind::Products => "products",
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "clicks" => Ok(ExportKind::Clicks),
            "conversions" => Ok(ExportKind::Conversions),
            "products" => Ok(ExportKind::Products),
            other => Err(AppError::bad_request(
                "Invalid export type",
                json!({ "fields": { "type": [format!("unknown export type '{other}'")] } }),
            )),
        }
    }
}

/// Pagination metadata returned with a page of results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// One page of results.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PageInfo,
}

/// Query for a partner's click history.
#[derive(Debug, Clone, Default)]
pub struct ClickQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub range: DateRange,
    pub converted: Option<bool>,
}

/// Service aggregating click history into reports.
pub struct AnalyticsService {
    clicks: Arc<dyn ClickRepository>,
    analytics: Arc<dyn AnalyticsRepository>,
}

impl AnalyticsService {
    pub fn new(clicks: Arc<dyn ClickRepository>, analytics: Arc<dyn AnalyticsRepository>) -> Self {
        Self { clicks, analytics }
    }

    /// Returns one page of a partner's clicks, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a malformed partner id, a page
    /// below 1 or past the addressable range, a limit outside 1-100 or an
    /// inverted date range.
    pub async fn get_partner_clicks(
        &self,
        partner_id: &str,
        query: ClickQuery,
    ) -> Result<Page<AffiliateClick>, AppError> {
        let page = query.page.unwrap_or(DEFAULT_PAGE);
        let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

        let mut errors = FieldErrors::new();
        check_partner_id(&mut errors, Some(partner_id));
        if page < 1 {
            errors.add("page", "must be at least 1");
        }
        check_limit(&mut errors, limit);
        query.range.check(&mut errors);
        let offset = page_offset(page, limit);
        if page >= 1 && (1..=MAX_LIMIT).contains(&limit) && offset.is_none() {
            errors.add("page", "is too large");
        }
        errors.into_result()?;

        let filter = ClickFilter::new(offset.unwrap_or_default(), limit)
            .with_partner(Some(partner_id.to_string()))
            .with_date_range(query.range.start, query.range.end)
            .with_converted(query.converted);

        let total = self.clicks.count(filter.clone()).await?;
        let items = self.clicks.list(filter).await?;

        Ok(Page {
            items,
            pagination: PageInfo {
                page,
                limit,
                total,
                total_pages: (total + limit - 1) / limit,
            },
        })
    }

    /// Per-product totals ordered by clicks, most clicked first.
    pub async fn get_product_performance(
        &self,
        range: DateRange,
        partner_id: Option<String>,
        limit: Option<i64>,
    ) -> Result<Vec<ProductPerformance>, AppError> {
        let limit = limit.unwrap_or(DEFAULT_PERFORMANCE_LIMIT);

        let mut errors = FieldErrors::new();
        check_partner_id(&mut errors, partner_id.as_deref());
        check_limit(&mut errors, limit);
        range.check(&mut errors);
        errors.into_result()?;

        self.analytics
            .product_performance(
                PerformanceFilter::new(range.start, range.end)
                    .with_partner(partner_id)
                    .with_limit(Some(limit)),
            )
            .await
    }

    /// Per-partner totals ordered by clicks, most clicked first.
    pub async fn get_partner_performance(
        &self,
        range: DateRange,
    ) -> Result<Vec<PartnerPerformance>, AppError> {
        let mut errors = FieldErrors::new();
        range.check(&mut errors);
        errors.into_result()?;

        self.analytics
            .partner_performance(PerformanceFilter::new(range.start, range.end))
            .await
    }

    /// Renders the requested report as CSV text with a header row.
    pub async fn export_performance_data(
        &self,
        range: DateRange,
        kind: ExportKind,
    ) -> Result<String, AppError> {
        let mut errors = FieldErrors::new();
        range.check(&mut errors);
        errors.into_result()?;

        let csv = match kind {
            ExportKind::Clicks => {
                let clicks = self.all_clicks(range, None).await?;
                to_csv(clicks.iter().map(ClickCsvRow::from))?
            }
            ExportKind::Conversions => {
                let clicks = self.all_clicks(range, Some(true)).await?;
                to_csv(clicks.iter().filter_map(ConversionCsvRow::from_click))?
            }
            ExportKind::Products => {
                let rows = self
                    .analytics
                    .product_performance(PerformanceFilter::new(range.start, range.end))
                    .await?;
                to_csv(rows.iter().map(ProductCsvRow::from))?
            }
        };

        tracing::info!(kind = %kind, bytes = csv.len(), "performance data exported");
        Ok(csv)
    }

    async fn all_clicks(
        &self,
        range: DateRange,
        converted: Option<bool>,
    ) -> Result<Vec<AffiliateClick>, AppError> {
        let mut clicks: Vec<AffiliateClick> = Vec::new();

        loop {
            let filter = ClickFilter::new(0, EXPORT_BATCH)
                .with_date_range(range.start, range.end)
                .with_converted(converted)
                .after(clicks.last().map(ClickCursor::at));
            let batch = self.clicks.list(filter).await?;
            let fetched = batch.len() as i64;
            clicks.extend(batch);

            if fetched < EXPORT_BATCH {
                break;
            }
        }

        Ok(clicks)
    }
}

fn check_partner_id(errors: &mut FieldErrors, partner_id: Option<&str>) {
    if partner_id.is_some_and(|id| !is_valid_identifier(id)) {
        errors.add("partnerId", "must be 1-64 characters of [A-Za-z0-9_-]");
    }
}

/// Row offset of `page`, or `None` when it does not fit in an `i64`.
fn page_offset(page: i64, limit: i64) -> Option<i64> {
    page.checked_sub(1)?.checked_mul(limit)
}

fn check_limit(errors: &mut FieldErrors, limit: i64) {
    if !(1..=MAX_LIMIT).contains(&limit) {
        errors.add("limit", format!("must be between 1 and {MAX_LIMIT}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CampaignParams, NewClick, ProductType};
    use crate::domain::repositories::{MockAnalyticsRepository, MockClickRepository};
    use chrono::TimeDelta;

    fn click(id: &str) -> AffiliateClick {
        click_at(id, Utc::now())
    }

    fn click_at(id: &str, created_at: DateTime<Utc>) -> AffiliateClick {
        AffiliateClick::from_new(NewClick {
            tracking_id: id.to_string(),
            partner_id: "P1".to_string(),
            product_id: "X1".to_string(),
            created_at,
            ip_address: "1.1.1.1".to_string(),
            user_agent: "UA".to_string(),
            referrer: None,
            session_id: None,
            user_id: None,
            campaign: CampaignParams::default(),
        })
    }

    fn service(clicks: MockClickRepository, analytics: MockAnalyticsRepository) -> AnalyticsService {
        AnalyticsService::new(Arc::new(clicks), Arc::new(analytics))
    }

    #[tokio::test]
    async fn test_partner_clicks_pagination() {
        let mut clicks = MockClickRepository::new();
        clicks
            .expect_count()
            .withf(|f| f.partner_id.as_deref() == Some("P1"))
            .returning(|_| Ok(45));
        clicks
            .expect_list()
            .withf(|f| f.offset == 20 && f.limit == 20)
            .times(1)
            .returning(|_| Ok(vec![click("a")]));

        let page = service(clicks, MockAnalyticsRepository::new())
            .get_partner_clicks(
                "P1",
                ClickQuery {
                    page: Some(2),
                    ..ClickQuery::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(
            page.pagination,
            PageInfo {
                page: 2,
                limit: 20,
                total: 45,
                total_pages: 3
            }
        );
    }

    #[tokio::test]
    async fn test_partner_clicks_validation() {
        let now = Utc::now();
        let err = service(MockClickRepository::new(), MockAnalyticsRepository::new())
            .get_partner_clicks(
                "bad id",
                ClickQuery {
                    page: Some(0),
                    limit: Some(101),
                    range: DateRange::new(Some(now), Some(now - TimeDelta::days(1))),
                    converted: None,
                },
            )
            .await
            .unwrap_err();

        let fields = &err.to_error_info().details["fields"];
        for field in ["partnerId", "page", "limit", "startDate"] {
            assert!(fields[field].is_array(), "missing {field}");
        }
    }

    #[tokio::test]
    async fn test_partner_clicks_page_past_offset_range() {
        let err = service(MockClickRepository::new(), MockAnalyticsRepository::new())
            .get_partner_clicks(
                "P1",
                ClickQuery {
                    page: Some(i64::MAX),
                    limit: Some(MAX_LIMIT),
                    ..ClickQuery::default()
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
        assert_eq!(
            err.to_error_info().details["fields"]["page"][0],
            "is too large"
        );
    }

    #[tokio::test]
    async fn test_product_performance_default_limit() {
        let mut analytics = MockAnalyticsRepository::new();
        analytics
            .expect_product_performance()
            .withf(|f| f.limit == Some(10) && f.partner_id.is_none())
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let rows = service(MockClickRepository::new(), analytics)
            .get_product_performance(DateRange::default(), None, None)
            .await
            .unwrap();

        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_export_products_csv() {
        let mut analytics = MockAnalyticsRepository::new();
        analytics.expect_product_performance().returning(|_| {
            Ok(vec![ProductPerformance {
                product_id: "X1".to_string(),
                product_name: "Card".to_string(),
                product_type: ProductType::CreditCard,
                partner_id: "P1".to_string(),
                total_clicks: 4,
                total_conversions: 1,
                conversion_rate: 0.25,
                revenue: 500.0,
            }])
        });

        let csv = service(MockClickRepository::new(), analytics)
            .export_performance_data(DateRange::default(), ExportKind::Products)
            .await
            .unwrap();

        let lines: Vec<&str> = csv.lines().collect();
        assert!(lines[0].starts_with("product_id,product_name"));
        assert_eq!(lines[1], "X1,Card,credit_card,P1,4,1,0.25,500.0");
    }

    #[tokio::test]
    async fn test_export_conversions_requests_converted_only() {
        let mut clicks = MockClickRepository::new();
        clicks
            .expect_list()
            .withf(|f| f.converted == Some(true))
            .times(1)
            .returning(|_| Ok(Vec::new()));

        let csv = service(clicks, MockAnalyticsRepository::new())
            .export_performance_data(DateRange::default(), ExportKind::Conversions)
            .await
            .unwrap();

        assert_eq!(csv.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_export_continues_from_last_row_of_previous_batch() {
        let base = Utc::now();
        let first_batch: Vec<AffiliateClick> = (0..EXPORT_BATCH)
            .map(|i| click_at(&format!("c{i:04}"), base - TimeDelta::seconds(i)))
            .collect();
        let boundary = ClickCursor::at(&first_batch[first_batch.len() - 1]);

        let mut clicks = MockClickRepository::new();
        clicks
            .expect_list()
            .withf(|f| f.after.is_none() && f.offset == 0)
            .times(1)
            .returning(move |_| Ok(first_batch.clone()));
        // A click recorded between batches is newer than the cursor and must
        // not push the boundary row into the second batch.
        clicks
            .expect_list()
            .withf(move |f| f.after.as_ref() == Some(&boundary) && f.offset == 0)
            .times(1)
            .returning(move |_| Ok(vec![click_at("c1000", base - TimeDelta::seconds(1000))]));

        let csv = service(clicks, MockAnalyticsRepository::new())
            .export_performance_data(DateRange::default(), ExportKind::Clicks)
            .await
            .unwrap();

        let rows: Vec<&str> = csv.lines().skip(1).collect();
        assert_eq!(rows.len(), 1001);
        let unique: std::collections::HashSet<&str> =
            rows.iter().map(|r| r.split(',').next().unwrap_or_default()).collect();
        assert_eq!(unique.len(), 1001);
    }

    #[test]
    fn test_export_kind_parse() {
        assert_eq!("clicks".parse::<ExportKind>().unwrap(), ExportKind::Clicks);
        assert!("everything".parse::<ExportKind>().is_err());
    }
}
