//! Business logic services for the application layer.

pub mod analytics_service;
pub mod auth_service;
pub mod conversion_service;
pub mod fraud_service;
pub mod link_service;
pub mod registry_lookup;
pub mod tracking_service;

pub use analytics_service::{AnalyticsService, ClickQuery, DateRange, ExportKind, Page, PageInfo};
pub use auth_service::{AuthService, hash_token};
pub use conversion_service::{ConversionRequest, ConversionService};
pub use fraud_service::FraudService;
pub use link_service::{LinkRequest, LinkService};
pub use tracking_service::{RedirectTarget, TrackClickInput, TrackingService, validate_tracking_params};
