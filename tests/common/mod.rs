#![allow(dead_code)]

use affiliate_tracker::application::services::hash_token;
use affiliate_tracker::domain::clock::ManualClock;
use affiliate_tracker::domain::entities::{NewPartner, NewProduct, ProductType};
use affiliate_tracker::domain::fraud::FraudPolicy;
use affiliate_tracker::domain::repositories::{RegistryRepository, TokenRepository};
use affiliate_tracker::infrastructure::memory::InMemoryStore;
use affiliate_tracker::routes::{RouterOptions, api_router};
use affiliate_tracker::state::{AppState, Repositories, ServiceSettings};
use axum::extract::ConnectInfo;
use axum_test::TestServer;
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use std::net::SocketAddr;
use std::sync::Arc;
use tower::Layer;

pub const SIGNING_SECRET: &str = "test-signing-secret";
pub const ADMIN_TOKEN: &str = "test-admin-token";
pub const ATTRIBUTION_DAYS: i64 = 30;

pub const ACTIVE_PARTNER: &str = "P1";
pub const ACTIVE_PRODUCT: &str = "X1";
pub const INACTIVE_PRODUCT: &str = "X2";
pub const INACTIVE_PARTNER: &str = "P2";
pub const INACTIVE_PARTNER_PRODUCT: &str = "Y1";
pub const APPLICATION_URL: &str = "https://bank.example/apply";

/// Everything a test needs to drive the API and inspect its effects.
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub store: Arc<InMemoryStore>,
}

impl TestApp {
    pub fn auth_header(&self) -> String {
        format!("Bearer {ADMIN_TOKEN}")
    }
}

pub fn start_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

/// Seeds the registry:
///
/// - `P1` (active) owning `X1` (active) and `X2` (inactive)
/// - `P2` (inactive) owning `Y1` (active)
pub async fn seed_registry(store: &InMemoryStore) {
    store
        .create_partner(partner(ACTIVE_PARTNER, "Acme Bank", true, Some(0.1)))
        .await
        .unwrap();
    store
        .create_partner(partner(INACTIVE_PARTNER, "Dormant Credit", false, None))
        .await
        .unwrap();

    store
        .create_product(product(ACTIVE_PRODUCT, ACTIVE_PARTNER, ProductType::PersonalLoan, true))
        .await
        .unwrap();
    store
        .create_product(product(INACTIVE_PRODUCT, ACTIVE_PARTNER, ProductType::CreditCard, false))
        .await
        .unwrap();
    store
        .create_product(product(
            INACTIVE_PARTNER_PRODUCT,
            INACTIVE_PARTNER,
            ProductType::HomeLoan,
            true,
        ))
        .await
        .unwrap();
}

fn partner(id: &str, name: &str, is_active: bool, commission_rate: Option<f64>) -> NewPartner {
    NewPartner {
        id: id.to_string(),
        name: name.to_string(),
        website: Some(format!("https://{}.example", id.to_lowercase())),
        commission_rate,
        is_active,
    }
}

fn product(id: &str, partner_id: &str, product_type: ProductType, is_active: bool) -> NewProduct {
    NewProduct {
        id: id.to_string(),
        partner_id: partner_id.to_string(),
        name: format!("Product {id}"),
        product_type,
        application_url: APPLICATION_URL.to_string(),
        is_active,
    }
}

pub fn test_settings() -> ServiceSettings {
    ServiceSettings {
        attribution_window: TimeDelta::days(ATTRIBUTION_DAYS),
        fraud_policy: FraudPolicy::default(),
        token_signing_secret: SIGNING_SECRET.to_string(),
        cookie_secure: false,
        behind_proxy: true,
    }
}

/// Builds a seeded in-memory application with a manual clock.
pub async fn create_test_app() -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    seed_registry(&store).await;

    let token_hash = hash_token(SIGNING_SECRET, ADMIN_TOKEN).unwrap();
    store.create_token("test", &token_hash).await.unwrap();

    let clock = Arc::new(ManualClock::new(start_time()));
    let state = AppState::new(
        Repositories::in_memory(store.clone()),
        test_settings(),
        clock.clone(),
    );

    let app = api_router(state.clone(), RouterOptions { rate_limit: false })
        .layer(MockConnectInfoLayer);
    let server = TestServer::new(app).unwrap();

    TestApp {
        server,
        state,
        clock,
        store,
    }
}

/// Tracks a click through the API and returns its tracking id.
pub async fn track_click(app: &TestApp, ip: &str) -> String {
    let response = app
        .server
        .post("/api/affiliate/track")
        .add_header("X-Forwarded-For", ip)
        .json(&serde_json::json!({
            "partnerId": ACTIVE_PARTNER,
            "productId": ACTIVE_PRODUCT,
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);

    let body: serde_json::Value = response.json();
    body["trackingId"].as_str().unwrap().to_string()
}

#[derive(Clone)]
pub struct MockConnectInfoLayer;

impl<S> Layer<S> for MockConnectInfoLayer {
    type Service = MockConnectInfoService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        MockConnectInfoService { inner }
    }
}

#[derive(Clone)]
pub struct MockConnectInfoService<S> {
    inner: S,
}

impl<S, B> tower::Service<axum::http::Request<B>> for MockConnectInfoService<S>
where
    S: tower::Service<axum::http::Request<B>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: axum::http::Request<B>) -> Self::Future {
        let addr: SocketAddr = "127.0.0.1:12345".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        self.inner.call(req)
    }
}
