//! DTOs for conversion recording and fraud checks.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::application::services::ConversionRequest;

/// Body of `POST /api/affiliate/convert`.
///
/// An empty `trackingId` falls back to the `affiliate-tracking` cookie.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ConvertRequest {
    #[serde(default)]
    pub tracking_id: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 64, message = "must be 1-64 characters"))]
    pub conversion_type: String,

    #[validate(range(min = 0.0, message = "must be >= 0"))]
    pub conversion_value: Option<f64>,

    pub metadata: Option<Value>,
}

impl ConvertRequest {
    pub fn into_request(self, tracking_id: String) -> ConversionRequest {
        ConversionRequest {
            tracking_id,
            conversion_type: self.conversion_type,
            conversion_value: self.conversion_value,
            metadata: self.metadata,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub success: bool,
}

/// Body of `POST /api/affiliate/fraud-check`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudCheckRequest {
    #[serde(default)]
    pub tracking_id: String,
}
