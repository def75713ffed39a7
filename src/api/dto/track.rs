//! DTOs for click tracking and redirects.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::TrackClickInput;
use crate::domain::entities::CampaignParams;
use crate::utils::client_info::ClientInfo;
use crate::utils::tracking_id::IDENTIFIER_RE;

/// Body of `POST /api/affiliate/track`.
///
/// Network metadata is taken from the transport, never from the body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    #[serde(default)]
    #[validate(regex(path = "*IDENTIFIER_RE", message = "must be 1-64 characters of [A-Za-z0-9_-]"))]
    pub partner_id: String,

    #[serde(default)]
    #[validate(regex(path = "*IDENTIFIER_RE", message = "must be 1-64 characters of [A-Za-z0-9_-]"))]
    pub product_id: String,

    #[validate(length(max = 128))]
    pub user_id: Option<String>,

    #[validate(regex(path = "*IDENTIFIER_RE", message = "must be 1-64 characters of [A-Za-z0-9_-]"))]
    pub session_id: Option<String>,

    #[validate(length(max = 255))]
    pub utm_source: Option<String>,
    #[validate(length(max = 255))]
    pub utm_medium: Option<String>,
    #[validate(length(max = 255))]
    pub utm_campaign: Option<String>,
}

impl TrackRequest {
    pub fn into_input(self, client: ClientInfo) -> TrackClickInput {
        TrackClickInput {
            partner_id: self.partner_id,
            product_id: self.product_id,
            ip_address: Some(client.ip_address),
            user_agent: Some(client.user_agent),
            referrer: client.referrer,
            session_id: self.session_id,
            user_id: self.user_id,
            campaign: CampaignParams::new(self.utm_source, self.utm_medium, self.utm_campaign),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackResponse {
    pub tracking_id: String,
}

/// Query of `GET /api/affiliate/redirect`, as produced by generated links.
#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    #[serde(default)]
    pub p: String,
    #[serde(default)]
    pub pr: String,
    /// Session id of the reader, when the referring page knows it.
    pub sid: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

impl RedirectQuery {
    pub fn into_input(self, client: ClientInfo) -> TrackClickInput {
        TrackClickInput {
            partner_id: self.p,
            product_id: self.pr,
            ip_address: Some(client.ip_address),
            user_agent: Some(client.user_agent),
            referrer: client.referrer,
            session_id: self.sid.filter(|sid| !sid.is_empty()),
            user_id: None,
            campaign: CampaignParams::new(self.utm_source, self.utm_medium, self.utm_campaign),
        }
    }
}
