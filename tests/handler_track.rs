mod common;

use affiliate_tracker::domain::repositories::ClickRepository;
use common::{ACTIVE_PARTNER, ACTIVE_PRODUCT, INACTIVE_PRODUCT};
use serde_json::json;

#[tokio::test]
async fn test_track_click_success() {
    let app = common::create_test_app().await;

    let response = app
        .server
        .post("/api/affiliate/track")
        .add_header("X-Forwarded-For", "198.51.100.4, 10.0.0.1")
        .add_header("User-Agent", "curl/8.0")
        .json(&json!({
            "partnerId": ACTIVE_PARTNER,
            "productId": ACTIVE_PRODUCT,
            "sessionId": "sess_42",
            "userId": "user-9",
            "utmCampaign": "spring"
        }))
        .await;

    assert_eq!(response.status_code(), 201);

    let body: serde_json::Value = response.json();
    let tracking_id = body["trackingId"].as_str().unwrap();
    assert!(!tracking_id.is_empty());

    let click = app
        .store
        .find_by_tracking_id(tracking_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(click.ip_address, "198.51.100.4");
    assert_eq!(click.user_agent, "curl/8.0");
    assert_eq!(click.session_id.as_deref(), Some("sess_42"));
    assert_eq!(click.user_id.as_deref(), Some("user-9"));
    assert_eq!(click.campaign.utm_campaign.as_deref(), Some("spring"));
    assert!(!click.converted);
}

#[tokio::test]
async fn test_track_click_ids_are_unique() {
    let app = common::create_test_app().await;

    let first = common::track_click(&app, "192.0.2.1").await;
    let second = common::track_click(&app, "192.0.2.1").await;

    assert_ne!(first, second);
    assert_eq!(app.store.click_count().await, 2);
}

#[tokio::test]
async fn test_track_click_lists_every_invalid_field() {
    let app = common::create_test_app().await;

    let response = app
        .server
        .post("/api/affiliate/track")
        .json(&json!({
            "partnerId": "bad id!",
            "productId": "",
            "sessionId": "also bad"
        }))
        .await;

    assert_eq!(response.status_code(), 400);

    let body: serde_json::Value = response.json();
    let fields = &body["error"]["details"]["fields"];
    assert!(fields["partnerId"].is_array());
    assert!(fields["productId"].is_array());
    assert!(fields["sessionId"].is_array());
    assert_eq!(app.store.click_count().await, 0);
}

#[tokio::test]
async fn test_track_click_inactive_product() {
    let app = common::create_test_app().await;

    let response = app
        .server
        .post("/api/affiliate/track")
        .json(&json!({ "partnerId": ACTIVE_PARTNER, "productId": INACTIVE_PRODUCT }))
        .await;

    assert_eq!(response.status_code(), 410);

    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "inactive_entity");
    assert_eq!(app.store.click_count().await, 0);
}

#[tokio::test]
async fn test_track_click_product_of_other_partner() {
    let app = common::create_test_app().await;

    let response = app
        .server
        .post("/api/affiliate/track")
        .json(&json!({
            "partnerId": ACTIVE_PARTNER,
            "productId": common::INACTIVE_PARTNER_PRODUCT
        }))
        .await;

    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_track_click_malformed_json() {
    let app = common::create_test_app().await;

    let response = app
        .server
        .post("/api/affiliate/track")
        .text("{not json")
        .content_type("application/json")
        .await;

    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_generate_link_success() {
    let app = common::create_test_app().await;

    let response = app
        .server
        .post("/api/affiliate/generate-link")
        .json(&json!({
            "partnerId": ACTIVE_PARTNER,
            "productId": ACTIVE_PRODUCT,
            "baseUrl": "https://compare.example/",
            "utmSource": "blog",
            "utmCampaign": "spring sale"
        }))
        .await;

    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(
        body["affiliateLink"],
        "https://compare.example/api/affiliate/redirect?p=P1&pr=X1&utm_source=blog&utm_campaign=spring+sale"
    );
    assert_eq!(app.store.click_count().await, 0);
}

#[tokio::test]
async fn test_generate_link_rejects_bad_base_url() {
    let app = common::create_test_app().await;

    let response = app
        .server
        .post("/api/affiliate/generate-link")
        .json(&json!({
            "partnerId": ACTIVE_PARTNER,
            "productId": ACTIVE_PRODUCT,
            "baseUrl": "not a url"
        }))
        .await;

    assert_eq!(response.status_code(), 400);

    let body: serde_json::Value = response.json();
    assert!(body["error"]["details"]["fields"]["baseUrl"].is_array());
}

#[tokio::test]
async fn test_generate_link_inactive_product() {
    let app = common::create_test_app().await;

    let response = app
        .server
        .post("/api/affiliate/generate-link")
        .json(&json!({
            "partnerId": ACTIVE_PARTNER,
            "productId": INACTIVE_PRODUCT,
            "baseUrl": "https://compare.example"
        }))
        .await;

    assert_eq!(response.status_code(), 410);
}
