//! DTOs for click history responses.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::application::services::PageInfo;
use crate::domain::entities::AffiliateClick;

/// One click in a partner's history.
///
/// Optional fields are omitted from JSON when `None`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickItem {
    pub tracking_id: String,
    pub partner_id: String,
    pub product_id: String,
    pub timestamp: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_medium: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub utm_campaign: Option<String>,

    pub converted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_metadata: Option<Value>,
}

impl From<AffiliateClick> for ClickItem {
    fn from(click: AffiliateClick) -> Self {
        let conversion = click.conversion;
        Self {
            tracking_id: click.tracking_id,
            partner_id: click.partner_id,
            product_id: click.product_id,
            timestamp: click.created_at,
            ip_address: click.ip_address,
            user_agent: click.user_agent,
            referrer: click.referrer,
            session_id: click.session_id,
            user_id: click.user_id,
            utm_source: click.campaign.utm_source,
            utm_medium: click.campaign.utm_medium,
            utm_campaign: click.campaign.utm_campaign,
            converted: click.converted,
            conversion_type: conversion.as_ref().map(|c| c.conversion_type.clone()),
            conversion_value: conversion.as_ref().map(|c| c.value),
            conversion_timestamp: conversion.as_ref().map(|c| c.converted_at),
            conversion_metadata: conversion.and_then(|c| c.metadata),
        }
    }
}

/// Response of `GET /api/affiliate/clicks/{partnerId}`.
#[derive(Debug, Serialize)]
pub struct ClicksResponse {
    pub items: Vec<ClickItem>,
    pub pagination: PageInfo,
}

/// Response wrapper for report listings.
#[derive(Debug, Serialize)]
pub struct ItemsResponse<T> {
    pub items: Vec<T>,
}
