//! Click entity representing a single tracked affiliate click.

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::campaign::CampaignParams;

/// Placeholder stored when the transport could not supply client metadata.
pub const UNKNOWN: &str = "unknown";

/// A click on an affiliate link, later joined to at most one conversion.
///
/// Created once by the click tracker and mutated at most once, when a
/// conversion is attributed to it. `converted_at` is never earlier than
/// `created_at`.
#[derive(Debug, Clone, PartialEq)]
pub struct AffiliateClick {
    pub tracking_id: String,
    pub partner_id: String,
    pub product_id: String,
    pub created_at: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,
    pub referrer: Option<String>,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub campaign: CampaignParams,
    pub converted: bool,
    pub conversion: Option<Conversion>,
}

/// Conversion data attached to a click.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub conversion_type: String,
    pub value: f64,
    pub converted_at: DateTime<Utc>,
    pub metadata: Option<Value>,
}

impl AffiliateClick {
    /// Builds a fresh, unconverted click from its creation data.
    pub fn from_new(new_click: NewClick) -> Self {
        Self {
            tracking_id: new_click.tracking_id,
            partner_id: new_click.partner_id,
            product_id: new_click.product_id,
            created_at: new_click.created_at,
            ip_address: new_click.ip_address,
            user_agent: new_click.user_agent,
            referrer: new_click.referrer,
            session_id: new_click.session_id,
            user_id: new_click.user_id,
            campaign: new_click.campaign,
            converted: false,
            conversion: None,
        }
    }

    /// Returns true if the transport could not supply the IP address or user agent.
    pub fn has_missing_metadata(&self) -> bool {
        is_unknown(&self.ip_address) || is_unknown(&self.user_agent)
    }

    /// Time between the click and its conversion, if converted.
    pub fn time_to_conversion(&self) -> Option<chrono::TimeDelta> {
        self.conversion
            .as_ref()
            .map(|c| c.converted_at - self.created_at)
    }

    /// Conversion value, `0.0` for unconverted clicks.
    pub fn revenue(&self) -> f64 {
        self.conversion.as_ref().map(|c| c.value).unwrap_or(0.0)
    }
}

/// Returns true for metadata the transport could not provide.
pub fn is_unknown(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case(UNKNOWN)
}

/// Input data for persisting a new click.
///
/// The tracking id and timestamp are minted by the tracking service before
/// the record reaches the store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewClick {
    pub tracking_id: String,
    pub partner_id: String,
    pub product_id: String,
    pub created_at: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: String,
    pub referrer: Option<String>,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub campaign: CampaignParams,
}

/// Conditional conversion write submitted to the click store.
///
/// The store applies it only if the click exists, is not yet converted and
/// was created at or after `window_start`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionUpdate {
    pub tracking_id: String,
    pub conversion_type: String,
    pub value: f64,
    pub metadata: Option<Value>,
    pub converted_at: DateTime<Utc>,
    pub window_start: DateTime<Utc>,
}

/// Result of a conditional conversion write.
#[derive(Debug, Clone, PartialEq)]
pub enum ConversionOutcome {
    Recorded(Box<AffiliateClick>),
    NotFound,
    AlreadyConverted,
    WindowExpired { clicked_at: DateTime<Utc> },
}
