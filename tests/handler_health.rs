mod common;

#[tokio::test]
async fn test_health_reports_store_status() {
    let app = common::create_test_app().await;

    let response = app.server.get("/health").await;

    assert_eq!(response.status_code(), 200);

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["checks"]["store"]["status"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_health_does_not_require_token() {
    let app = common::create_test_app().await;

    let response = app
        .server
        .get("/health")
        .add_header("Authorization", "Bearer wrong")
        .await;

    assert_eq!(response.status_code(), 200);
}
