//! Admin reporting handlers: click history, performance and CSV export.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::header,
    response::IntoResponse,
};
use chrono::Utc;

use crate::api::dto::clicks::{ClickItem, ClicksResponse, ItemsResponse};
use crate::api::dto::pagination::{
    ClicksQueryParams, DateFilterParams, ExportParams, ProductPerformanceParams,
};
use crate::application::services::ExportKind;
use crate::domain::repositories::{PartnerPerformance, ProductPerformance};
use crate::error::AppError;
use crate::state::AppState;

/// Paginated click history of one partner, newest first.
///
/// # Endpoint
///
/// `GET /api/affiliate/clicks/{partnerId}`
///
/// # Query Parameters
///
/// - `page` (optional): Page number (default: 1)
/// - `limit` (optional): Items per page (default: 20, max: 100)
/// - `startDate`, `endDate` (optional): RFC 3339 or `YYYY-MM-DD`
/// - `converted` (optional): `true` or `false`
pub async fn partner_clicks_handler(
    State(state): State<AppState>,
    Path(partner_id): Path<String>,
    params: Result<Query<ClicksQueryParams>, QueryRejection>,
) -> Result<Json<ClicksResponse>, AppError> {
    let Query(params) = params?;

    let page = state
        .analytics_service
        .get_partner_clicks(&partner_id, params.to_query()?)
        .await?;

    Ok(Json(ClicksResponse {
        items: page.items.into_iter().map(ClickItem::from).collect(),
        pagination: page.pagination,
    }))
}

/// Per-product clicks, conversions and revenue, most clicked first.
///
/// # Endpoint
///
/// `GET /api/affiliate/performance/products?startDate=&endDate=&partnerId=&limit=`
pub async fn product_performance_handler(
    State(state): State<AppState>,
    params: Result<Query<ProductPerformanceParams>, QueryRejection>,
) -> Result<Json<ItemsResponse<ProductPerformance>>, AppError> {
    let Query(params) = params?;
    let range = params.date_filter.to_range()?;

    let items = state
        .analytics_service
        .get_product_performance(range, params.partner_id, params.limit)
        .await?;

    Ok(Json(ItemsResponse { items }))
}

/// Per-partner totals, most clicked first.
///
/// # Endpoint
///
/// `GET /api/affiliate/performance/partners?startDate=&endDate=`
pub async fn partner_performance_handler(
    State(state): State<AppState>,
    params: Result<Query<DateFilterParams>, QueryRejection>,
) -> Result<Json<ItemsResponse<PartnerPerformance>>, AppError> {
    let Query(params) = params?;

    let items = state
        .analytics_service
        .get_partner_performance(params.to_range()?)
        .await?;

    Ok(Json(ItemsResponse { items }))
}

/// CSV download of clicks, conversions or product performance.
///
/// # Endpoint
///
/// `GET /api/affiliate/export?type=clicks|conversions|products&startDate=&endDate=`
///
/// `type` defaults to `clicks`. The body always starts with a header row.
pub async fn export_handler(
    State(state): State<AppState>,
    params: Result<Query<ExportParams>, QueryRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Query(params) = params?;

    let kind = match params.kind.as_deref() {
        None | Some("") => ExportKind::Clicks,
        Some(kind) => kind.parse()?,
    };
    let range = params.date_filter.to_range()?;

    let csv = state
        .analytics_service
        .export_performance_data(range, kind)
        .await?;

    let filename = format!(
        "attachment; filename=\"affiliate-{kind}-{}.csv\"",
        Utc::now().format("%Y%m%d")
    );

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, filename),
        ],
        csv,
    ))
}
