//! Handlers for conversions and fraud checks.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
};
use validator::Validate;

use super::redirect::TRACKING_COOKIE;
use crate::api::dto::conversion::{ConvertRequest, ConvertResponse, FraudCheckRequest};
use crate::domain::fraud::FraudReport;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::client_info::cookie_value;

/// Attributes a conversion to a tracked click.
///
/// # Endpoint
///
/// `POST /api/affiliate/convert`
///
/// # Request Body
///
/// ```json
/// { "trackingId": "...", "conversionType": "signup", "conversionValue": 500, "metadata": {} }
/// ```
///
/// When `trackingId` is absent or empty the `affiliate-tracking` cookie is used.
///
/// # Errors
///
/// - 400 for invalid input or an expired attribution window
/// - 404 for an unknown tracking id or a click that already converted
pub async fn convert_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<ConvertRequest>, JsonRejection>,
) -> Result<Json<ConvertResponse>, AppError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let tracking_id = match payload.tracking_id.trim() {
        "" => cookie_value(&headers, TRACKING_COOKIE).unwrap_or_default(),
        id => id.to_string(),
    };

    state
        .conversion_service
        .record_conversion(payload.into_request(tracking_id))
        .await?;

    Ok(Json(ConvertResponse { success: true }))
}

/// Evaluates a click against the fraud heuristics. Admin only.
///
/// # Endpoint
///
/// `POST /api/affiliate/fraud-check`
///
/// # Response
///
/// ```json
/// {
///   "trackingId": "...",
///   "riskLevel": "high",
///   "signals": ["high-click-velocity"],
///   "recommendation": "review manually",
///   "clickCount": 11
/// }
/// ```
pub async fn fraud_check_handler(
    State(state): State<AppState>,
    payload: Result<Json<FraudCheckRequest>, JsonRejection>,
) -> Result<Json<FraudReport>, AppError> {
    let Json(payload) = payload?;

    let report = state
        .fraud_service
        .detect_fraud(payload.tracking_id.trim())
        .await?;

    Ok(Json(report))
}
