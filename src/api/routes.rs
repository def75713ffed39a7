//! API route configuration.
//!
//! Everything is mounted under `/api/affiliate`. Admin routes require Bearer
//! token authentication via [`crate::api::middleware::auth`].

use crate::api::handlers::{
    convert_handler, export_handler, fraud_check_handler, generate_link_handler,
    partner_clicks_handler, partner_performance_handler, product_performance_handler,
    redirect_handler, track_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

/// Public tracking routes.
///
/// # Endpoints
///
/// - `POST /track`          - Record a click
/// - `GET  /redirect`       - Record a click and redirect to the partner
/// - `POST /convert`        - Attribute a conversion
/// - `POST /generate-link`  - Build an affiliate link
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/track", post(track_handler))
        .route("/redirect", get(redirect_handler))
        .route("/convert", post(convert_handler))
        .route("/generate-link", post(generate_link_handler))
}

/// Admin routes, protected by Bearer token authentication.
///
/// # Endpoints
///
/// - `GET  /clicks/{partnerId}`     - Paginated click history
/// - `POST /fraud-check`            - Fraud report for a click
/// - `GET  /performance/products`   - Product performance
/// - `GET  /performance/partners`   - Partner performance
/// - `GET  /export`                 - CSV export
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/clicks/{partner_id}", get(partner_clicks_handler))
        .route("/fraud-check", post(fraud_check_handler))
        .route("/performance/products", get(product_performance_handler))
        .route("/performance/partners", get(partner_performance_handler))
        .route("/export", get(export_handler))
}
