//! Conversion attribution.

use std::sync::Arc;

use chrono::TimeDelta;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::domain::clock::Clock;
use crate::domain::entities::{AffiliateClick, ConversionOutcome, ConversionUpdate};
use crate::domain::repositories::ClickRepository;
use crate::error::{AppError, FieldErrors};
use crate::utils::tracking_id::is_valid_identifier;

const MAX_CONVERSION_TYPE_LEN: usize = 64;

/// Conversion signal reported by a client.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub tracking_id: String,
    pub conversion_type: String,
    /// Defaults to `0.0`.
    pub conversion_value: Option<f64>,
    pub metadata: Option<Value>,
}

/// Service attributing conversions to the click that caused them.
///
/// A click converts at most once, and only within the attribution window
/// measured from the click timestamp with the server clock.
pub struct ConversionService {
    clicks: Arc<dyn ClickRepository>,
    clock: Arc<dyn Clock>,
    attribution_window: TimeDelta,
}

impl ConversionService {
    pub fn new(
        clicks: Arc<dyn ClickRepository>,
        clock: Arc<dyn Clock>,
        attribution_window: TimeDelta,
    ) -> Self {
        Self {
            clicks,
            clock,
            attribution_window,
        }
    }

    pub fn attribution_window(&self) -> TimeDelta {
        self.attribution_window
    }

    /// Records a conversion for a tracked click.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a malformed request.
    /// Returns [`AppError::NotFound`] if no click has the tracking id.
    /// Returns [`AppError::AlreadyConverted`] if the click already converted.
    /// Returns [`AppError::AttributionWindowExpired`] if the click is too old.
    pub async fn record_conversion(
        &self,
        request: ConversionRequest,
    ) -> Result<AffiliateClick, AppError> {
        let value = validate(&request)?;

        let now = self.clock.now();
        let update = ConversionUpdate {
            tracking_id: request.tracking_id.clone(),
            conversion_type: request.conversion_type.trim().to_string(),
            value,
            metadata: request.metadata,
            converted_at: now,
            window_start: now - self.attribution_window,
        };

        let tracking_id = request.tracking_id;
        match self.clicks.record_conversion(update).await? {
            ConversionOutcome::Recorded(click) => {
                metrics::counter!("affiliate_conversions_total").increment(1);
                info!(
                    tracking_id = %tracking_id,
                    partner_id = %click.partner_id,
                    product_id = %click.product_id,
                    value,
                    "conversion recorded"
                );
                Ok(*click)
            }
            ConversionOutcome::NotFound => {
                warn!(tracking_id = %tracking_id, reason = "not_found", "conversion rejected");
                Err(AppError::not_found(
                    "Click not found",
                    json!({ "trackingId": tracking_id }),
                ))
            }
            ConversionOutcome::AlreadyConverted => {
                warn!(tracking_id = %tracking_id, reason = "already_converted", "conversion rejected");
                Err(AppError::already_converted(
                    "Click already converted",
                    json!({ "trackingId": tracking_id }),
                ))
            }
            ConversionOutcome::WindowExpired { clicked_at } => {
                warn!(tracking_id = %tracking_id, reason = "window_expired", "conversion rejected");
                Err(AppError::window_expired(
                    "Conversion is outside the attribution window",
                    json!({
                        "trackingId": tracking_id,
                        "clickedAt": clicked_at.to_rfc3339(),
                        "windowDays": self.attribution_window.num_days(),
                    }),
                ))
            }
        }
    }
}

fn validate(request: &ConversionRequest) -> Result<f64, AppError> {
    let mut errors = FieldErrors::new();

    if request.tracking_id.trim().is_empty() {
        errors.add("trackingId", "is required");
    } else if !is_valid_identifier(&request.tracking_id) {
        errors.add("trackingId", "is malformed");
    }

    let conversion_type = request.conversion_type.trim();
    if conversion_type.is_empty() {
        errors.add("conversionType", "is required");
    } else if conversion_type.chars().count() > MAX_CONVERSION_TYPE_LEN {
        errors.add(
            "conversionType",
            format!("must be at most {MAX_CONVERSION_TYPE_LEN} characters"),
        );
    }

    let value = request.conversion_value.unwrap_or(0.0);
    if !value.is_finite() || value < 0.0 {
        errors.add("conversionValue", "must be a finite number >= 0");
    }

    if request.metadata.as_ref().is_some_and(|m| !m.is_object()) {
        errors.add("metadata", "must be a JSON object");
    }

    errors.into_result()?;
    Ok(value)
}
