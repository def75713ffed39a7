//! Shared application state injected into every handler.

use chrono::TimeDelta;
use sqlx::PgPool;
use std::sync::Arc;

use crate::application::services::{
    AnalyticsService, AuthService, ConversionService, FraudService, LinkService, TrackingService,
};
use crate::domain::clock::Clock;
use crate::domain::fraud::FraudPolicy;
use crate::domain::repositories::{
    AnalyticsRepository, ClickRepository, RegistryRepository, TokenRepository,
};
use crate::infrastructure::memory::InMemoryStore;
use crate::infrastructure::persistence::{
    PgAnalyticsRepository, PgClickRepository, PgRegistryRepository, PgTokenRepository,
};

/// Repository handles backing the services.
#[derive(Clone)]
pub struct Repositories {
    pub registry: Arc<dyn RegistryRepository>,
    pub clicks: Arc<dyn ClickRepository>,
    pub analytics: Arc<dyn AnalyticsRepository>,
    pub tokens: Arc<dyn TokenRepository>,
}

impl Repositories {
    pub fn postgres(pool: Arc<PgPool>) -> Self {
        Self {
            registry: Arc::new(PgRegistryRepository::new(pool.clone())),
            clicks: Arc::new(PgClickRepository::new(pool.clone())),
            analytics: Arc::new(PgAnalyticsRepository::new(pool.clone())),
            tokens: Arc::new(PgTokenRepository::new(pool)),
        }
    }

    /// All four repositories served by one in-process store.
    pub fn in_memory(store: Arc<InMemoryStore>) -> Self {
        Self {
            registry: store.clone(),
            clicks: store.clone(),
            analytics: store.clone(),
            tokens: store,
        }
    }
}

/// Tunables passed from configuration into the services.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub attribution_window: TimeDelta,
    pub fraud_policy: FraudPolicy,
    pub token_signing_secret: String,
    pub cookie_secure: bool,
    pub behind_proxy: bool,
}

/// Application state shared across all HTTP handlers.
///
/// Cheap to clone: every service sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub tracking_service: Arc<TrackingService>,
    pub link_service: Arc<LinkService>,
    pub conversion_service: Arc<ConversionService>,
    pub fraud_service: Arc<FraudService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub auth_service: Arc<AuthService>,
    /// Adds `Secure` to the tracking cookie.
    pub cookie_secure: bool,
    /// Read the client IP from forwarding headers.
    pub behind_proxy: bool,
    /// Tracking cookie lifetime, equal to the attribution window.
    pub attribution_window: TimeDelta,
}

impl AppState {
    pub fn new(repos: Repositories, settings: ServiceSettings, clock: Arc<dyn Clock>) -> Self {
        Self {
            tracking_service: Arc::new(TrackingService::new(
                repos.registry.clone(),
                repos.clicks.clone(),
                clock.clone(),
            )),
            link_service: Arc::new(LinkService::new(repos.registry)),
            conversion_service: Arc::new(ConversionService::new(
                repos.clicks.clone(),
                clock,
                settings.attribution_window,
            )),
            fraud_service: Arc::new(FraudService::new(
                repos.clicks.clone(),
                settings.fraud_policy,
            )),
            analytics_service: Arc::new(AnalyticsService::new(repos.clicks, repos.analytics)),
            auth_service: Arc::new(AuthService::new(
                repos.tokens,
                settings.token_signing_secret,
            )),
            cookie_secure: settings.cookie_secure,
            behind_proxy: settings.behind_proxy,
            attribution_window: settings.attribution_window,
        }
    }
}
