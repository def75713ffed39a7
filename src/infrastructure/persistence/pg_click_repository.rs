//! PostgreSQL implementation of the click store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{
    AffiliateClick, CampaignParams, Conversion, ConversionOutcome, ConversionUpdate, NewClick,
};
use crate::domain::repositories::{ClickFilter, ClickRepository};
use crate::error::AppError;

const CLICK_COLUMNS: &str = "tracking_id, partner_id, product_id, created_at, ip_address, \
     user_agent, referrer, session_id, user_id, utm_source, utm_medium, utm_campaign, \
     converted, conversion_type, conversion_value, converted_at, conversion_metadata";

const FILTER_CLAUSE: &str = r#"
    WHERE ($1::text IS NULL OR partner_id = $1)
      AND ($2::text IS NULL OR product_id = $2)
      AND ($3::timestamptz IS NULL OR created_at >= $3)
      AND ($4::timestamptz IS NULL OR created_at <= $4)
      AND ($5::boolean IS NULL OR converted = $5)
"#;

/// PostgreSQL repository for click tracking and conversion attribution.
///
/// The conversion write is a single conditional `UPDATE`, so the database
/// row lock decides races between concurrent conversions.
pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ClickRow {
    tracking_id: String,
    partner_id: String,
    product_id: String,
    created_at: DateTime<Utc>,
    ip_address: String,
    user_agent: String,
    referrer: Option<String>,
    session_id: Option<String>,
    user_id: Option<String>,
    utm_source: Option<String>,
    utm_medium: Option<String>,
    utm_campaign: Option<String>,
    converted: bool,
    conversion_type: Option<String>,
    conversion_value: Option<f64>,
    converted_at: Option<DateTime<Utc>>,
    conversion_metadata: Option<Value>,
}

impl From<ClickRow> for AffiliateClick {
    fn from(row: ClickRow) -> Self {
        let conversion = match (row.converted, row.converted_at) {
            (true, Some(converted_at)) => Some(Conversion {
                conversion_type: row.conversion_type.unwrap_or_default(),
                value: row.conversion_value.unwrap_or(0.0),
                converted_at,
                metadata: row.conversion_metadata,
            }),
            _ => None,
        };

        Self {
            tracking_id: row.tracking_id,
            partner_id: row.partner_id,
            product_id: row.product_id,
            created_at: row.created_at,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            referrer: row.referrer,
            session_id: row.session_id,
            user_id: row.user_id,
            campaign: CampaignParams {
                utm_source: row.utm_source,
                utm_medium: row.utm_medium,
                utm_campaign: row.utm_campaign,
            },
            converted: row.converted,
            conversion,
        }
    }
}

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn create(&self, new_click: NewClick) -> Result<AffiliateClick, AppError> {
        let sql = format!(
            "INSERT INTO affiliate_clicks \
             (tracking_id, partner_id, product_id, created_at, ip_address, user_agent, \
              referrer, session_id, user_id, utm_source, utm_medium, utm_campaign) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
             RETURNING {CLICK_COLUMNS}"
        );
        let row: ClickRow = sqlx::query_as(&sql)
            .bind(&new_click.tracking_id)
            .bind(&new_click.partner_id)
            .bind(&new_click.product_id)
            .bind(new_click.created_at)
            .bind(&new_click.ip_address)
            .bind(&new_click.user_agent)
            .bind(&new_click.referrer)
            .bind(&new_click.session_id)
            .bind(&new_click.user_id)
            .bind(&new_click.campaign.utm_source)
            .bind(&new_click.campaign.utm_medium)
            .bind(&new_click.campaign.utm_campaign)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(row.into())
    }

    async fn find_by_tracking_id(
        &self,
        tracking_id: &str,
    ) -> Result<Option<AffiliateClick>, AppError> {
        let sql = format!("SELECT {CLICK_COLUMNS} FROM affiliate_clicks WHERE tracking_id = $1");
        let row: Option<ClickRow> = sqlx::query_as(&sql)
            .bind(tracking_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(AffiliateClick::from))
    }

    async fn record_conversion(
        &self,
        update: ConversionUpdate,
    ) -> Result<ConversionOutcome, AppError> {
        // GREATEST keeps converted_at >= created_at under clock skew.
        let sql = format!(
            "UPDATE affiliate_clicks \
             SET converted = TRUE, \
                 conversion_type = $2, \
                 conversion_value = $3, \
                 conversion_metadata = $4, \
                 converted_at = GREATEST($5, created_at) \
             WHERE tracking_id = $1 AND converted = FALSE AND created_at >= $6 \
             RETURNING {CLICK_COLUMNS}"
        );
        let row: Option<ClickRow> = sqlx::query_as(&sql)
            .bind(&update.tracking_id)
            .bind(&update.conversion_type)
            .bind(update.value)
            .bind(&update.metadata)
            .bind(update.converted_at)
            .bind(update.window_start)
            .fetch_optional(self.pool.as_ref())
            .await?;

        if let Some(row) = row {
            return Ok(ConversionOutcome::Recorded(Box::new(row.into())));
        }

        // The write was refused; read current state to report why.
        let outcome = match self.find_by_tracking_id(&update.tracking_id).await? {
            None => ConversionOutcome::NotFound,
            Some(click) if click.converted => ConversionOutcome::AlreadyConverted,
            Some(click) => ConversionOutcome::WindowExpired {
                clicked_at: click.created_at,
            },
        };

        Ok(outcome)
    }

    async fn count_by_ip_between(
        &self,
        ip_address: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM affiliate_clicks
            WHERE ip_address = $1
              AND created_at >= $2
              AND created_at <= $3
            "#,
        )
        .bind(ip_address)
        .bind(from)
        .bind(to)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn count_by_session_between(
        &self,
        session_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM affiliate_clicks
            WHERE session_id = $1
              AND created_at >= $2
              AND created_at <= $3
            "#,
        )
        .bind(session_id)
        .bind(from)
        .bind(to)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn list(&self, filter: ClickFilter) -> Result<Vec<AffiliateClick>, AppError> {
        let sql = format!(
            "SELECT {CLICK_COLUMNS} FROM affiliate_clicks {FILTER_CLAUSE} \
               AND ($8::timestamptz IS NULL OR (created_at, tracking_id) < ($8, $9::text)) \
             ORDER BY created_at DESC, tracking_id DESC LIMIT $6 OFFSET $7"
        );
        let (after_at, after_id) = filter
            .after
            .map(|c| (c.created_at, c.tracking_id))
            .unzip();
        let rows: Vec<ClickRow> = sqlx::query_as(&sql)
            .bind(&filter.partner_id)
            .bind(&filter.product_id)
            .bind(filter.from_date)
            .bind(filter.to_date)
            .bind(filter.converted)
            .bind(filter.limit)
            .bind(filter.offset)
            .bind(after_at)
            .bind(after_id)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(AffiliateClick::from).collect())
    }

    async fn count(&self, filter: ClickFilter) -> Result<i64, AppError> {
        let sql = format!("SELECT COUNT(*) FROM affiliate_clicks {FILTER_CLAUSE}");
        let (count,): (i64,) = sqlx::query_as(&sql)
            .bind(&filter.partner_id)
            .bind(&filter.product_id)
            .bind(filter.from_date)
            .bind(filter.to_date)
            .bind(filter.converted)
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }
}
