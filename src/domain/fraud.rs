//! Deterministic click fraud heuristics.
//!
//! The policy is a pure function of a click and the number of sibling clicks
//! the store reports around it. All cutoffs are configuration values
//! ([`FraudPolicy`]); nothing here mutates click state.

use chrono::TimeDelta;
use serde::Serialize;

use super::entities::AffiliateClick;

const DEFAULT_HIGH_CLICK_THRESHOLD: i64 = 10;
const DEFAULT_MEDIUM_CLICK_THRESHOLD: i64 = 3;
const DEFAULT_VELOCITY_WINDOW_SECS: i64 = 3600;
const DEFAULT_MIN_CONVERSION_SECS: i64 = 1;
const DEFAULT_SESSION_CLICK_THRESHOLD: i64 = 10;

/// Risk classification derived from IP click velocity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Operator action for this level.
    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskLevel::High => "review manually",
            RiskLevel::Medium => "monitor",
            RiskLevel::Low => "none",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::High => "high",
            RiskLevel::Medium => "medium",
            RiskLevel::Low => "low",
        }
    }
}

/// Named heuristic flag contributing to a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FraudSignal {
    /// The same IP produced more clicks than the medium threshold.
    HighClickVelocity,
    /// The conversion followed the click faster than a human could act.
    SuspiciousTiming,
    /// IP address or user agent could not be determined.
    MissingMetadata,
    /// One browsing session produced an abnormal number of clicks.
    SessionBurst,
}

/// Advisory fraud report for a single click.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudReport {
    pub tracking_id: String,
    pub risk_level: RiskLevel,
    pub signals: Vec<FraudSignal>,
    pub recommendation: &'static str,
    /// Clicks from the same IP inside the velocity window, the click included.
    pub click_count: i64,
}

/// Tunable cutoffs for the heuristics.
#[derive(Debug, Clone, PartialEq)]
pub struct FraudPolicy {
    /// `high` when the IP click count exceeds this.
    pub high_click_threshold: i64,
    /// `medium` when the IP click count exceeds this.
    pub medium_click_threshold: i64,
    /// Sibling clicks are counted within this distance of the click timestamp.
    pub velocity_window: TimeDelta,
    /// Conversions faster than this are flagged.
    pub min_conversion_interval: TimeDelta,
    /// `session-burst` when one session exceeds this many clicks in the window.
    pub session_click_threshold: i64,
}

impl Default for FraudPolicy {
    fn default() -> Self {
        Self {
            high_click_threshold: DEFAULT_HIGH_CLICK_THRESHOLD,
            medium_click_threshold: DEFAULT_MEDIUM_CLICK_THRESHOLD,
            velocity_window: TimeDelta::seconds(DEFAULT_VELOCITY_WINDOW_SECS),
            min_conversion_interval: TimeDelta::seconds(DEFAULT_MIN_CONVERSION_SECS),
            session_click_threshold: DEFAULT_SESSION_CLICK_THRESHOLD,
        }
    }
}

impl FraudPolicy {
    /// Classifies IP click velocity. Thresholds are strict: a count equal to a
    /// threshold stays in the lower level.
    pub fn classify(&self, ip_click_count: i64) -> RiskLevel {
        if ip_click_count > self.high_click_threshold {
            RiskLevel::High
        } else if ip_click_count > self.medium_click_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// Builds the report for `click` given the sibling counts from the store.
    ///
    /// Signals are emitted in a fixed order so repeated evaluations compare equal.
    pub fn evaluate(
        &self,
        click: &AffiliateClick,
        ip_click_count: i64,
        session_click_count: i64,
    ) -> FraudReport {
        let risk_level = self.classify(ip_click_count);
        let mut signals = Vec::new();

        if risk_level != RiskLevel::Low {
            signals.push(FraudSignal::HighClickVelocity);
        }

        if click
            .time_to_conversion()
            .is_some_and(|elapsed| elapsed < self.min_conversion_interval)
        {
            signals.push(FraudSignal::SuspiciousTiming);
        }

        if click.has_missing_metadata() {
            signals.push(FraudSignal::MissingMetadata);
        }

        if session_click_count > self.session_click_threshold {
            signals.push(FraudSignal::SessionBurst);
        }

        FraudReport {
            tracking_id: click.tracking_id.clone(),
            risk_level,
            signals,
            recommendation: risk_level.recommendation(),
            click_count: ip_click_count,
        }
    }
}
