//! Utility functions for identifiers, URL building and request metadata.
//!
//! - [`tracking_id`] - Tracking id generation and identifier validation
//! - [`url_builder`] - Affiliate link and destination URL construction
//! - [`client_info`] - Client IP, user agent, referrer and cookie extraction
//! - [`csv_export`] - CSV serialization of report rows

pub mod client_info;
pub mod csv_export;
pub mod tracking_id;
pub mod url_builder;
