//! PostgreSQL implementation of the partner/product registry.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{AffiliatePartner, NewPartner, NewProduct, Product, ProductType};
use crate::domain::repositories::RegistryRepository;
use crate::error::AppError;

const PARTNER_SELECT: &str = r#"
    SELECT p.id, p.name, p.website, p.commission_rate, p.is_active, p.created_at,
           COALESCE(
               array_agg(pr.id ORDER BY pr.id) FILTER (WHERE pr.id IS NOT NULL),
               '{}'
           ) AS product_ids
    FROM affiliate_partners p
    LEFT JOIN affiliate_products pr ON pr.partner_id = p.id
"#;

const PRODUCT_COLUMNS: &str =
    "id, partner_id, name, product_type, application_url, is_active, created_at";

/// PostgreSQL repository for partners and products.
pub struct PgRegistryRepository {
    pool: Arc<PgPool>,
}

impl PgRegistryRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct PartnerRow {
    id: String,
    name: String,
    website: Option<String>,
    commission_rate: Option<f64>,
    is_active: bool,
    created_at: DateTime<Utc>,
    product_ids: Vec<String>,
}

impl From<PartnerRow> for AffiliatePartner {
    fn from(row: PartnerRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            website: row.website,
            commission_rate: row.commission_rate,
            is_active: row.is_active,
            product_ids: row.product_ids,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    partner_id: String,
    name: String,
    product_type: String,
    application_url: String,
    is_active: bool,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = AppError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let product_type: ProductType = row.product_type.parse().map_err(|e| {
            AppError::internal(
                "Corrupt product record",
                json!({ "product_id": row.id, "reason": format!("{e}") }),
            )
        })?;

        Ok(Self {
            id: row.id,
            partner_id: row.partner_id,
            name: row.name,
            product_type,
            application_url: row.application_url,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl RegistryRepository for PgRegistryRepository {
    async fn find_partner(&self, partner_id: &str) -> Result<Option<AffiliatePartner>, AppError> {
        let sql = format!("{PARTNER_SELECT} WHERE p.id = $1 GROUP BY p.id");
        let row: Option<PartnerRow> = sqlx::query_as(&sql)
            .bind(partner_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        Ok(row.map(AffiliatePartner::from))
    }

    async fn find_product(&self, product_id: &str) -> Result<Option<Product>, AppError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM affiliate_products WHERE id = $1");
        let row: Option<ProductRow> = sqlx::query_as(&sql)
            .bind(product_id)
            .fetch_optional(self.pool.as_ref())
            .await?;

        row.map(Product::try_from).transpose()
    }

    async fn list_partners(&self) -> Result<Vec<AffiliatePartner>, AppError> {
        let sql = format!("{PARTNER_SELECT} GROUP BY p.id ORDER BY p.id");
        let rows: Vec<PartnerRow> = sqlx::query_as(&sql)
            .fetch_all(self.pool.as_ref())
            .await?;

        Ok(rows.into_iter().map(AffiliatePartner::from).collect())
    }

    async fn list_products(&self, partner_id: Option<String>) -> Result<Vec<Product>, AppError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM affiliate_products \
             WHERE ($1::text IS NULL OR partner_id = $1) ORDER BY id"
        );
        let rows: Vec<ProductRow> = sqlx::query_as(&sql)
            .bind(partner_id)
            .fetch_all(self.pool.as_ref())
            .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    async fn create_partner(&self, new_partner: NewPartner) -> Result<AffiliatePartner, AppError> {
        let row: PartnerRow = sqlx::query_as(
            r#"
            INSERT INTO affiliate_partners (id, name, website, commission_rate, is_active)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, website, commission_rate, is_active, created_at,
                      '{}'::text[] AS product_ids
            "#,
        )
        .bind(&new_partner.id)
        .bind(&new_partner.name)
        .bind(&new_partner.website)
        .bind(new_partner.commission_rate)
        .bind(new_partner.is_active)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn create_product(&self, new_product: NewProduct) -> Result<Product, AppError> {
        let sql = format!(
            "INSERT INTO affiliate_products \
             (id, partner_id, name, product_type, application_url, is_active) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {PRODUCT_COLUMNS}"
        );
        let row: ProductRow = sqlx::query_as(&sql)
            .bind(&new_product.id)
            .bind(&new_product.partner_id)
            .bind(&new_product.name)
            .bind(new_product.product_type.as_str())
            .bind(&new_product.application_url)
            .bind(new_product.is_active)
            .fetch_one(self.pool.as_ref())
            .await
            .map_err(|e| {
                if e.as_database_error()
                    .is_some_and(|db| db.is_foreign_key_violation())
                {
                    AppError::not_found(
                        "Partner not found",
                        json!({ "partner_id": new_product.partner_id }),
                    )
                } else {
                    AppError::from(e)
                }
            })?;

        Product::try_from(row)
    }
}
