//! Application layer services implementing the attribution rules.
//!
//! Services validate input, consult the registry and drive the click store
//! through the repository traits. HTTP handlers and the CLI call into this
//! layer and never touch a repository directly.
//!
//! # Available Services
//!
//! - [`services::tracking_service::TrackingService`] - Click tracking and redirects
//! - [`services::link_service::LinkService`] - Affiliate link generation
//! - [`services::conversion_service::ConversionService`] - Conversion attribution
//! - [`services::fraud_service::FraudService`] - Click fraud reports
//! - [`services::analytics_service::AnalyticsService`] - Click history, reports and exports
//! - [`services::auth_service::AuthService`] - Admin token authentication

pub mod services;
