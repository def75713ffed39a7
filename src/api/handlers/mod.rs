//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod analytics;
pub mod conversion;
pub mod health;
pub mod redirect;
pub mod track;

pub use analytics::{
    export_handler, partner_clicks_handler, partner_performance_handler,
    product_performance_handler,
};
pub use conversion::{convert_handler, fraud_check_handler};
pub use health::health_handler;
pub use redirect::{TRACKING_COOKIE, redirect_handler};
pub use track::{generate_link_handler, track_handler};
