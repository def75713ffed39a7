//! Operator-invoked click fraud evaluation.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::domain::entities::is_unknown;
use crate::domain::fraud::{FraudPolicy, FraudReport};
use crate::domain::repositories::ClickRepository;
use crate::error::{AppError, FieldErrors};
use crate::utils::tracking_id::is_valid_identifier;

/// Service evaluating a click against the fraud heuristics.
///
/// Sibling clicks are counted from persisted history in the window that ends
/// at the click's own timestamp, so later traffic never changes a report.
/// Never mutates click state.
pub struct FraudService {
    clicks: Arc<dyn ClickRepository>,
    policy: FraudPolicy,
}

impl FraudService {
    pub fn new(clicks: Arc<dyn ClickRepository>, policy: FraudPolicy) -> Self {
        Self { clicks, policy }
    }

    pub fn policy(&self) -> &FraudPolicy {
        &self.policy
    }

    /// Produces the fraud report for a tracking id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a malformed tracking id.
    /// Returns [`AppError::NotFound`] if no click has the tracking id.
    pub async fn detect_fraud(&self, tracking_id: &str) -> Result<FraudReport, AppError> {
        let mut errors = FieldErrors::new();
        if !is_valid_identifier(tracking_id) {
            errors.add("trackingId", "must be a well-formed tracking id");
        }
        errors.into_result()?;

        let click = self
            .clicks
            .find_by_tracking_id(tracking_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found("Click not found", json!({ "trackingId": tracking_id }))
            })?;

        let from = click.created_at - self.policy.velocity_window;
        let to = click.created_at;

        // An unknown IP would lump unrelated clients together.
        let ip_click_count = if is_unknown(&click.ip_address) {
            0
        } else {
            self.clicks
                .count_by_ip_between(&click.ip_address, from, to)
                .await?
        };

        let session_click_count = match click.session_id.as_deref() {
            Some(session_id) => {
                self.clicks
                    .count_by_session_between(session_id, from, to)
                    .await?
            }
            None => 0,
        };

        let report = self
            .policy
            .evaluate(&click, ip_click_count, session_click_count);

        info!(
            tracking_id = %report.tracking_id,
            risk_level = report.risk_level.as_str(),
            click_count = report.click_count,
            signals = report.signals.len(),
            "fraud report"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{AffiliateClick, CampaignParams, NewClick};
    use crate::domain::fraud::{FraudSignal, RiskLevel};
    use crate::domain::repositories::MockClickRepository;
    use chrono::{TimeDelta, Utc};

    fn click(ip: &str, session: Option<&str>) -> AffiliateClick {
        AffiliateClick::from_new(NewClick {
            tracking_id: "trk".to_string(),
            partner_id: "P1".to_string(),
            product_id: "X1".to_string(),
            created_at: Utc::now(),
            ip_address: ip.to_string(),
            user_agent: "UA".to_string(),
            referrer: None,
            session_id: session.map(String::from),
            user_id: None,
            campaign: CampaignParams::default(),
        })
    }

    #[tokio::test]
    async fn test_unknown_click() {
        let mut clicks = MockClickRepository::new();
        clicks.expect_find_by_tracking_id().returning(|_| Ok(None));

        let err = FraudService::new(Arc::new(clicks), FraudPolicy::default())
            .detect_fraud("missing")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_counts_trailing_window() {
        let c = click("1.2.3.4", None);
        let at = c.created_at;

        let mut clicks = MockClickRepository::new();
        clicks
            .expect_find_by_tracking_id()
            .returning(move |_| Ok(Some(c.clone())));
        clicks
            .expect_count_by_ip_between()
            .withf(move |ip, from, to| {
                ip.to_string() == "1.2.3.4"
                    && *from == at - TimeDelta::hours(1)
                    && *to == at
            })
            .times(1)
            .returning(|_, _, _| Ok(11));

        let report = FraudService::new(Arc::new(clicks), FraudPolicy::default())
            .detect_fraud("trk")
            .await
            .unwrap();

        assert_eq!(report.risk_level, RiskLevel::High);
        assert_eq!(report.recommendation, "review manually");
        assert_eq!(report.signals, vec![FraudSignal::HighClickVelocity]);
    }

    #[tokio::test]
    async fn test_unknown_ip_skips_velocity() {
        let c = click("unknown", None);
        let mut clicks = MockClickRepository::new();
        clicks
            .expect_find_by_tracking_id()
            .returning(move |_| Ok(Some(c.clone())));
        clicks.expect_count_by_ip_between().never();

        let report = FraudService::new(Arc::new(clicks), FraudPolicy::default())
            .detect_fraud("trk")
            .await
            .unwrap();

        assert_eq!(report.risk_level, RiskLevel::Low);
        assert_eq!(report.signals, vec![FraudSignal::MissingMetadata]);
    }

    #[tokio::test]
    async fn test_session_burst() {
        let c = click("9.9.9.9", Some("sess"));
        let mut clicks = MockClickRepository::new();
        clicks
            .expect_find_by_tracking_id()
            .returning(move |_| Ok(Some(c.clone())));
        clicks
            .expect_count_by_ip_between()
            .returning(|_, _, _| Ok(1));
        clicks
            .expect_count_by_session_between()
            .returning(|_, _, _| Ok(12));

        let report = FraudService::new(Arc::new(clicks), FraudPolicy::default())
            .detect_fraud("trk")
            .await
            .unwrap();

        assert_eq!(report.risk_level, RiskLevel::Low);
        assert_eq!(report.signals, vec![FraudSignal::SessionBurst]);
    }
}
