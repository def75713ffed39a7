//! Click tracking and redirect resolution.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use super::registry_lookup::resolve_active_offer;
use crate::domain::clock::Clock;
use crate::domain::entities::{AffiliateClick, CampaignParams, NewClick, UNKNOWN, is_unknown};
use crate::domain::repositories::{ClickRepository, RegistryRepository};
use crate::error::{AppError, FieldErrors};
use crate::utils::tracking_id::{generate_tracking_id, is_valid_identifier};
use crate::utils::url_builder::with_tracking_id;

/// Attempts at minting a fresh tracking id before giving up.
const MAX_ID_ATTEMPTS: usize = 3;

const MAX_USER_ID_LEN: usize = 128;
const MAX_REFERRER_LEN: usize = 2048;
const MAX_CAMPAIGN_LEN: usize = 255;

/// Click data supplied by the HTTP boundary.
#[derive(Debug, Clone, Default)]
pub struct TrackClickInput {
    pub partner_id: String,
    pub product_id: String,
    /// `None` when the transport could not determine it.
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub campaign: CampaignParams,
}

/// Result of a redirect: the recorded click and where to send the reader.
#[derive(Debug, Clone)]
pub struct RedirectTarget {
    pub tracking_id: String,
    pub redirect_url: String,
}

/// Checks a click request, listing every invalid field.
///
/// Missing network metadata is not an error; it is recorded as `unknown`.
pub fn validate_tracking_params(input: &TrackClickInput) -> Result<(), AppError> {
    let mut errors = FieldErrors::new();

    check_identifier(&mut errors, "partnerId", &input.partner_id);
    check_identifier(&mut errors, "productId", &input.product_id);

    if let Some(session_id) = &input.session_id
        && !is_valid_identifier(session_id)
    {
        errors.add("sessionId", "must be 1-64 characters of [A-Za-z0-9_-]");
    }
    check_length(&mut errors, "userId", input.user_id.as_deref(), MAX_USER_ID_LEN);
    check_length(&mut errors, "referrer", input.referrer.as_deref(), MAX_REFERRER_LEN);
    check_length(
        &mut errors,
        "utmSource",
        input.campaign.utm_source.as_deref(),
        MAX_CAMPAIGN_LEN,
    );
    check_length(
        &mut errors,
        "utmMedium",
        input.campaign.utm_medium.as_deref(),
        MAX_CAMPAIGN_LEN,
    );
    check_length(
        &mut errors,
        "utmCampaign",
        input.campaign.utm_campaign.as_deref(),
        MAX_CAMPAIGN_LEN,
    );

    errors.into_result()
}

fn check_identifier(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.add(field, "is required");
    } else if !is_valid_identifier(value) {
        errors.add(field, "must be 1-64 characters of [A-Za-z0-9_-]");
    }
}

fn check_length(errors: &mut FieldErrors, field: &str, value: Option<&str>, max: usize) {
    if value.is_some_and(|v| v.chars().count() > max) {
        errors.add(field, format!("must be at most {max} characters"));
    }
}

fn metadata_or_unknown(value: Option<String>) -> String {
    value
        .filter(|v| !is_unknown(v))
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// Service recording clicks and resolving redirects.
///
/// A click is only persisted after its partner and product are verified
/// active, so the store never holds orphan clicks.
pub struct TrackingService {
    registry: Arc<dyn RegistryRepository>,
    clicks: Arc<dyn ClickRepository>,
    clock: Arc<dyn Clock>,
}

impl TrackingService {
    pub fn new(
        registry: Arc<dyn RegistryRepository>,
        clicks: Arc<dyn ClickRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            clicks,
            clock,
        }
    }

    /// Records a click and returns its tracking id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for malformed input.
    /// Returns [`AppError::NotFound`] / [`AppError::InactiveEntity`] if the
    /// partner or product cannot receive traffic.
    pub async fn track_click(&self, input: TrackClickInput) -> Result<String, AppError> {
        let click = self.record(input, |_| Ok(())).await?;
        Ok(click.tracking_id)
    }

    /// Records a click for an inbound redirect and returns the destination.
    ///
    /// The destination is the product's application URL with the tracking id
    /// appended. It is built before the click is stored, so a broken product
    /// URL fails the request without leaving a click behind.
    pub async fn process_redirect(&self, input: TrackClickInput) -> Result<RedirectTarget, AppError> {
        let mut redirect_url = String::new();
        let click = self
            .record(input, |candidate| {
                redirect_url = with_tracking_id(&candidate.application_url, &candidate.tracking_id)
                    .map_err(|e| {
                        AppError::internal(
                            "Product has an invalid application URL",
                            json!({ "reason": e.to_string() }),
                        )
                    })?;
                Ok(())
            })
            .await?;

        Ok(RedirectTarget {
            tracking_id: click.tracking_id,
            redirect_url,
        })
    }

    /// Verifies the click store is reachable.
    pub async fn ping_store(&self) -> Result<(), AppError> {
        self.clicks.ping().await
    }

    async fn record<F>(&self, input: TrackClickInput, mut prepare: F) -> Result<AffiliateClick, AppError>
    where
        F: FnMut(&Candidate<'_>) -> Result<(), AppError>,
    {
        validate_tracking_params(&input)?;

        let offer =
            resolve_active_offer(self.registry.as_ref(), &input.partner_id, &input.product_id)
                .await?;

        let ip_address = metadata_or_unknown(input.ip_address);
        let user_agent = metadata_or_unknown(input.user_agent);

        for attempt in 1..=MAX_ID_ATTEMPTS {
            let tracking_id = generate_tracking_id()?;
            prepare(&Candidate {
                tracking_id: &tracking_id,
                application_url: &offer.product.application_url,
            })?;

            let new_click = NewClick {
                tracking_id,
                partner_id: offer.partner.id.clone(),
                product_id: offer.product.id.clone(),
                created_at: self.clock.now(),
                ip_address: ip_address.clone(),
                user_agent: user_agent.clone(),
                referrer: input.referrer.clone(),
                session_id: input.session_id.clone(),
                user_id: input.user_id.clone(),
                campaign: input.campaign.clone(),
            };

            match self.clicks.create(new_click).await {
                Ok(click) => {
                    metrics::counter!("affiliate_clicks_total").increment(1);
                    info!(
                        tracking_id = %click.tracking_id,
                        partner_id = %click.partner_id,
                        product_id = %click.product_id,
                        "click tracked"
                    );
                    return Ok(click);
                }
                Err(AppError::Conflict { .. }) if attempt < MAX_ID_ATTEMPTS => {
                    warn!(attempt, "tracking id collision, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        Err(AppError::internal(
            "Failed to allocate a unique tracking id",
            json!({ "attempts": MAX_ID_ATTEMPTS }),
        ))
    }
}

/// Click about to be stored, exposed to redirect URL construction.
struct Candidate<'a> {
    tracking_id: &'a str,
    application_url: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::clock::ManualClock;
    use crate::domain::entities::{AffiliatePartner, Product, ProductType};
    use crate::domain::repositories::{MockClickRepository, MockRegistryRepository};
    use chrono::Utc;

    fn registry(application_url: &'static str) -> MockRegistryRepository {
        let mut mock = MockRegistryRepository::new();
        mock.expect_find_partner().returning(|_| {
            Ok(Some(AffiliatePartner {
                id: "P1".to_string(),
                name: "Bank".to_string(),
                website: None,
                commission_rate: None,
                is_active: true,
                product_ids: vec!["X1".to_string()],
                created_at: Utc::now(),
            }))
        });
        mock.expect_find_product().returning(move |_| {
            Ok(Some(Product {
                id: "X1".to_string(),
                partner_id: "P1".to_string(),
                name: "Card".to_string(),
                product_type: ProductType::CreditCard,
                application_url: application_url.to_string(),
                is_active: true,
                created_at: Utc::now(),
            }))
        });
        mock
    }

    fn input() -> TrackClickInput {
        TrackClickInput {
            partner_id: "P1".to_string(),
            product_id: "X1".to_string(),
            ..TrackClickInput::default()
        }
    }

    fn service(registry: MockRegistryRepository, clicks: MockClickRepository) -> TrackingService {
        TrackingService::new(
            Arc::new(registry),
            Arc::new(clicks),
            Arc::new(ManualClock::new(Utc::now())),
        )
    }

    #[test]
    fn test_validation_lists_every_field() {
        let err = validate_tracking_params(&TrackClickInput {
            partner_id: "".to_string(),
            product_id: "not/valid".to_string(),
            session_id: Some("has space".to_string()),
            referrer: Some("r".repeat(3000)),
            ..TrackClickInput::default()
        })
        .unwrap_err();

        let fields = &err.to_error_info().details["fields"];
        assert!(fields["partnerId"].is_array());
        assert!(fields["productId"].is_array());
        assert!(fields["sessionId"].is_array());
        assert!(fields["referrer"].is_array());
    }

    #[test]
    fn test_missing_metadata_is_valid() {
        assert!(validate_tracking_params(&input()).is_ok());
    }

    #[tokio::test]
    async fn test_track_click_defaults_unknown_metadata() {
        let mut clicks = MockClickRepository::new();
        clicks
            .expect_create()
            .withf(|c| c.ip_address == "unknown" && c.user_agent == "unknown" && !c.tracking_id.is_empty())
            .times(1)
            .returning(|c| Ok(AffiliateClick::from_new(c)));

        let id = service(registry("https://bank.example/apply"), clicks)
            .track_click(input())
            .await
            .unwrap();

        assert_eq!(id.len(), 22);
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_store() {
        let err = service(MockRegistryRepository::new(), MockClickRepository::new())
            .track_click(TrackClickInput::default())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[tokio::test]
    async fn test_collision_is_retried() {
        let mut clicks = MockClickRepository::new();
        let mut seq = mockall::Sequence::new();
        clicks
            .expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(AppError::conflict("dup", json!({}))));
        clicks
            .expect_create()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|c| Ok(AffiliateClick::from_new(c)));

        let result = service(registry("https://bank.example/apply"), clicks)
            .track_click(input())
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_redirect_appends_tracking_id() {
        let mut clicks = MockClickRepository::new();
        clicks
            .expect_create()
            .times(1)
            .returning(|c| Ok(AffiliateClick::from_new(c)));

        let target = service(registry("https://bank.example/apply?offer=1"), clicks)
            .process_redirect(input())
            .await
            .unwrap();

        assert_eq!(
            target.redirect_url,
            format!(
                "https://bank.example/apply?offer=1&trackingId={}",
                target.tracking_id
            )
        );
    }

    #[tokio::test]
    async fn test_redirect_with_broken_destination_stores_nothing() {
        let target = service(registry("javascript:alert(1)"), MockClickRepository::new())
            .process_redirect(input())
            .await;

        assert!(matches!(target, Err(AppError::Internal { .. })));
    }
}
