//! CSV serialization of click history and performance reports.
//!
//! Every export starts with a header row, also when there are no data rows.

use csv::WriterBuilder;
use serde::Serialize;
use serde_json::json;

use crate::domain::entities::AffiliateClick;
use crate::domain::repositories::ProductPerformance;
use crate::error::AppError;

/// A row type with a fixed column header.
pub trait CsvRecord: Serialize {
    const HEADERS: &'static [&'static str];
}

/// One row per tracked click.
#[derive(Debug, Clone, Serialize)]
pub struct ClickCsvRow {
    pub tracking_id: String,
    pub partner_id: String,
    pub product_id: String,
    pub clicked_at: String,
    pub ip_address: String,
    pub user_agent: String,
    pub referrer: String,
    pub session_id: String,
    pub utm_source: String,
    pub utm_medium: String,
    pub utm_campaign: String,
    pub converted: bool,
}

impl CsvRecord for ClickCsvRow {
    const HEADERS: &'static [&'static str] = &[
        "tracking_id",
        "partner_id",
        "product_id",
        "clicked_at",
        "ip_address",
        "user_agent",
        "referrer",
        "session_id",
        "utm_source",
        "utm_medium",
        "utm_campaign",
        "converted",
    ];
}

impl From<&AffiliateClick> for ClickCsvRow {
    fn from(click: &AffiliateClick) -> Self {
        Self {
            tracking_id: click.tracking_id.clone(),
            partner_id: click.partner_id.clone(),
            product_id: click.product_id.clone(),
            clicked_at: click.created_at.to_rfc3339(),
            ip_address: click.ip_address.clone(),
            user_agent: click.user_agent.clone(),
            referrer: click.referrer.clone().unwrap_or_default(),
            session_id: click.session_id.clone().unwrap_or_default(),
            utm_source: click.campaign.utm_source.clone().unwrap_or_default(),
            utm_medium: click.campaign.utm_medium.clone().unwrap_or_default(),
            utm_campaign: click.campaign.utm_campaign.clone().unwrap_or_default(),
            converted: click.converted,
        }
    }
}

/// One row per converted click.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionCsvRow {
    pub tracking_id: String,
    pub partner_id: String,
    pub product_id: String,
    pub clicked_at: String,
    pub converted_at: String,
    pub conversion_type: String,
    pub conversion_value: f64,
}

impl CsvRecord for ConversionCsvRow {
    const HEADERS: &'static [&'static str] = &[
        "tracking_id",
        "partner_id",
        "product_id",
        "clicked_at",
        "converted_at",
        "conversion_type",
        "conversion_value",
    ];
}

impl ConversionCsvRow {
    /// Builds the row, or `None` for an unconverted click.
    pub fn from_click(click: &AffiliateClick) -> Option<Self> {
        let conversion = click.conversion.as_ref()?;
        Some(Self {
            tracking_id: click.tracking_id.clone(),
            partner_id: click.partner_id.clone(),
            product_id: click.product_id.clone(),
            clicked_at: click.created_at.to_rfc3339(),
            converted_at: conversion.converted_at.to_rfc3339(),
            conversion_type: conversion.conversion_type.clone(),
            conversion_value: conversion.value,
        })
    }
}

/// One row per product performance summary.
#[derive(Debug, Clone, Serialize)]
pub struct ProductCsvRow {
    pub product_id: String,
    pub product_name: String,
    pub product_type: String,
    pub partner_id: String,
    pub total_clicks: i64,
    pub total_conversions: i64,
    pub conversion_rate: f64,
    pub revenue: f64,
}

impl CsvRecord for ProductCsvRow {
    const HEADERS: &'static [&'static str] = &[
        "product_id",
        "product_name",
        "product_type",
        "partner_id",
        "total_clicks",
        "total_conversions",
        "conversion_rate",
        "revenue",
    ];
}

impl From<&ProductPerformance> for ProductCsvRow {
    fn from(row: &ProductPerformance) -> Self {
        Self {
            product_id: row.product_id.clone(),
            product_name: row.product_name.clone(),
            product_type: row.product_type.to_string(),
            partner_id: row.partner_id.clone(),
            total_clicks: row.total_clicks,
            total_conversions: row.total_conversions,
            conversion_rate: (row.conversion_rate * 10_000.0).round() / 10_000.0,
            revenue: row.revenue,
        }
    }
}

fn csv_error(e: impl std::fmt::Display) -> AppError {
    AppError::internal("Failed to write CSV", json!({ "reason": e.to_string() }))
}

/// Serializes `rows` into CSV text preceded by the record's header row.
pub fn to_csv<R: CsvRecord>(rows: impl IntoIterator<Item = R>) -> Result<String, AppError> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer.write_record(R::HEADERS).map_err(csv_error)?;
    for row in rows {
        writer.serialize(&row).map_err(csv_error)?;
    }

    let bytes = writer.into_inner().map_err(csv_error)?;
    String::from_utf8(bytes).map_err(csv_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CampaignParams, Conversion, NewClick};
    use chrono::{TimeZone, Utc};

    fn click(converted: bool) -> AffiliateClick {
        let created_at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut click = AffiliateClick::from_new(NewClick {
            tracking_id: "trk".to_string(),
            partner_id: "P1".to_string(),
            product_id: "X1".to_string(),
            created_at,
            ip_address: "9.9.9.9".to_string(),
            user_agent: "Agent, with comma".to_string(),
            referrer: None,
            session_id: None,
            user_id: None,
            campaign: CampaignParams::new(Some("mail".to_string()), None, None),
        });
        if converted {
            click.converted = true;
            click.conversion = Some(Conversion {
                conversion_type: "signup".to_string(),
                value: 500.0,
                converted_at: created_at,
                metadata: None,
            });
        }
        click
    }

    #[test]
    fn test_empty_export_has_header() {
        let csv = to_csv(Vec::<ClickCsvRow>::new()).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("tracking_id,partner_id,product_id,clicked_at"));
    }

    #[test]
    fn test_click_rows_are_quoted() {
        let csv = to_csv([ClickCsvRow::from(&click(false))]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("\"Agent, with comma\""));
        assert!(lines[1].contains(",mail,"));
        assert!(lines[1].ends_with("false"));
    }

    #[test]
    fn test_conversion_row_skips_unconverted() {
        assert!(ConversionCsvRow::from_click(&click(false)).is_none());

        let row = ConversionCsvRow::from_click(&click(true)).unwrap();
        let csv = to_csv([row]).unwrap();
        assert!(csv.lines().nth(1).unwrap().ends_with("signup,500.0"));
    }
}
