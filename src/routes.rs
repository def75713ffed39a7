//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /health`            - Store connectivity check (public)
//! - `/api/affiliate/*`        - Tracking endpoints (public) and reports (Bearer token)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Rate limiting** - Per-IP token bucket (optional)
//! - **Authentication** - Bearer token on admin routes
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::health_handler;
use crate::api::middleware::{auth, rate_limit, tracing};
use crate::state::AppState;
use axum::routing::get;
use axum::{Router, middleware};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Router switches not carried by [`AppState`].
#[derive(Debug, Clone, Copy)]
pub struct RouterOptions {
    pub rate_limit: bool,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self { rate_limit: true }
    }
}

/// Constructs the application router with all routes and middleware.
///
/// Rate limiting reads the client IP from forwarding headers when
/// `state.behind_proxy` is set, otherwise from the socket peer address, so
/// the server must be started with connect info.
pub fn app_router(state: AppState, options: RouterOptions) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(api_router(state, options))
}

/// All routes and middleware except path normalization.
pub fn api_router(state: AppState, options: RouterOptions) -> Router {
    let mut public = api::routes::public_routes();
    let mut admin = api::routes::admin_routes()
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::layer));

    if options.rate_limit {
        public = rate_limit::apply(public, rate_limit::PUBLIC, state.behind_proxy);
        admin = rate_limit::apply(admin, rate_limit::ADMIN, state.behind_proxy);
    }

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/affiliate", public.merge(admin))
        .with_state(state)
        .layer(tracing::layer())
}
