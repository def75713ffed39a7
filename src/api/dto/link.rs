//! DTOs for affiliate link generation.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::LinkRequest;
use crate::domain::entities::CampaignParams;
use crate::utils::tracking_id::IDENTIFIER_RE;

/// Body of `POST /api/affiliate/generate-link`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLinkRequest {
    #[serde(default)]
    #[validate(regex(path = "*IDENTIFIER_RE", message = "must be 1-64 characters of [A-Za-z0-9_-]"))]
    pub partner_id: String,

    #[serde(default)]
    #[validate(regex(path = "*IDENTIFIER_RE", message = "must be 1-64 characters of [A-Za-z0-9_-]"))]
    pub product_id: String,

    #[serde(default)]
    #[validate(url(message = "Invalid URL format"))]
    pub base_url: String,

    #[validate(length(max = 255))]
    pub utm_source: Option<String>,
    #[validate(length(max = 255))]
    pub utm_medium: Option<String>,
    #[validate(length(max = 255))]
    pub utm_campaign: Option<String>,
}

impl From<GenerateLinkRequest> for LinkRequest {
    fn from(req: GenerateLinkRequest) -> Self {
        LinkRequest {
            partner_id: req.partner_id,
            product_id: req.product_id,
            base_url: req.base_url,
            campaign: CampaignParams::new(req.utm_source, req.utm_medium, req.utm_campaign),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLinkResponse {
    pub affiliate_link: String,
}
