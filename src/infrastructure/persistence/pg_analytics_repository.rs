//! PostgreSQL implementation of performance aggregation.

use async_trait::async_trait;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::ProductType;
use crate::domain::repositories::analytics_repository::{commission, conversion_rate};
use crate::domain::repositories::{
    AnalyticsRepository, PartnerPerformance, PerformanceFilter, ProductPerformance,
};
use crate::error::AppError;

/// PostgreSQL repository for product and partner performance.
///
/// Clicks are joined with `LEFT JOIN` so products and partners without
/// clicks in range still appear with zero totals.
pub struct PgAnalyticsRepository {
    pool: Arc<PgPool>,
}

impl PgAnalyticsRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProductPerformanceRow {
    product_id: String,
    product_name: String,
    product_type: String,
    partner_id: String,
    total_clicks: i64,
    total_conversions: i64,
    revenue: f64,
}

impl TryFrom<ProductPerformanceRow> for ProductPerformance {
    type Error = AppError;

    fn try_from(row: ProductPerformanceRow) -> Result<Self, Self::Error> {
        let product_type: ProductType = row.product_type.parse().map_err(|e| {
            AppError::internal(
                "Corrupt product record",
                json!({ "product_id": row.product_id, "reason": format!("{e}") }),
            )
        })?;

        Ok(Self {
            conversion_rate: conversion_rate(row.total_clicks, row.total_conversions),
            product_id: row.product_id,
            product_name: row.product_name,
            product_type,
            partner_id: row.partner_id,
            total_clicks: row.total_clicks,
            total_conversions: row.total_conversions,
            revenue: row.revenue,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PartnerPerformanceRow {
    partner_id: String,
    partner_name: String,
    is_active: bool,
    commission_rate: Option<f64>,
    total_clicks: i64,
    total_conversions: i64,
    revenue: f64,
}

impl From<PartnerPerformanceRow> for PartnerPerformance {
    fn from(row: PartnerPerformanceRow) -> Self {
        Self {
            conversion_rate: conversion_rate(row.total_clicks, row.total_conversions),
            commission: commission(row.revenue, row.commission_rate),
            partner_id: row.partner_id,
            partner_name: row.partner_name,
            is_active: row.is_active,
            total_clicks: row.total_clicks,
            total_conversions: row.total_conversions,
            revenue: row.revenue,
        }
    }
}

#[async_trait]
impl AnalyticsRepository for PgAnalyticsRepository {
    async fn product_performance(
        &self,
        filter: PerformanceFilter,
    ) -> Result<Vec<ProductPerformance>, AppError> {
        let rows: Vec<ProductPerformanceRow> = sqlx::query_as(
            r#"
            SELECT
                pr.id AS product_id,
                pr.name AS product_name,
                pr.product_type,
                pr.partner_id,
                COUNT(c.id) AS total_clicks,
                COUNT(c.id) FILTER (WHERE c.converted) AS total_conversions,
                COALESCE(SUM(c.conversion_value) FILTER (WHERE c.converted), 0::double precision)
                    AS revenue
            FROM affiliate_products pr
            LEFT JOIN affiliate_clicks c ON c.product_id = pr.id
                AND ($1::timestamptz IS NULL OR c.created_at >= $1)
                AND ($2::timestamptz IS NULL OR c.created_at <= $2)
            WHERE ($3::text IS NULL OR pr.partner_id = $3)
            GROUP BY pr.id, pr.name, pr.product_type, pr.partner_id
            ORDER BY total_clicks DESC, pr.id ASC
            LIMIT $4
            "#,
        )
        .bind(filter.from_date)
        .bind(filter.to_date)
        .bind(&filter.partner_id)
        .bind(filter.limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(ProductPerformance::try_from).collect()
    }

    async fn partner_performance(
        &self,
        filter: PerformanceFilter,
    ) -> Result<Vec<PartnerPerformance>, AppError> {
        let rows: Vec<PartnerPerformanceRow> = sqlx::query_as(
            r#"
            SELECT
                p.id AS partner_id,
                p.name AS partner_name,
                p.is_active,
                p.commission_rate,
                COUNT(c.id) AS total_clicks,
                COUNT(c.id) FILTER (WHERE c.converted) AS total_conversions,
                COALESCE(SUM(c.conversion_value) FILTER (WHERE c.converted), 0::double precision)
                    AS revenue
            FROM affiliate_partners p
            LEFT JOIN affiliate_clicks c ON c.partner_id = p.id
                AND ($1::timestamptz IS NULL OR c.created_at >= $1)
                AND ($2::timestamptz IS NULL OR c.created_at <= $2)
            WHERE ($3::text IS NULL OR p.id = $3)
            GROUP BY p.id, p.name, p.is_active, p.commission_rate
            ORDER BY total_clicks DESC, p.id ASC
            LIMIT $4
            "#,
        )
        .bind(filter.from_date)
        .bind(filter.to_date)
        .bind(&filter.partner_id)
        .bind(filter.limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(PartnerPerformance::from).collect())
    }
}
