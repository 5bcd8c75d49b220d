// Integration tests for bKash Gateway
//
// These tests drive the full HTTP stack (routing, extraction, error
// responses) against a mock bKash server.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use mockito::{Mock, ServerGuard};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use bkash_gateway::{
    auth::{gateway::GRANT_TOKEN_PATH, TokenManager, TokenState},
    config::GatewayConfig,
    models::CreatePaymentRequest,
    payment::{PaymentClient, CREATE_PAYMENT_PATH, EXECUTE_PAYMENT_PATH},
    routes::{self, AppState, SIGNATURE_HEADER},
    webhook,
};

const APP_SECRET: &str = "app-secret";

// ==================================================================================================
// Test Helpers
// ==================================================================================================

fn test_config(base_url: &str) -> Arc<GatewayConfig> {
    Arc::new(GatewayConfig::new("app-key", APP_SECRET, "merchant", "hunter2").with_base_url(base_url))
}

/// Create a test application state pointed at `base_url`
fn create_test_app_state(base_url: &str) -> AppState {
    let token_manager = Arc::new(
        TokenManager::new(test_config(base_url)).expect("Failed to create test token manager"),
    );

    AppState {
        token_manager,
        webhook_tolerance_secs: webhook::DEFAULT_TIMESTAMP_TOLERANCE_SECS,
        shutdown: CancellationToken::new(),
    }
}

fn build_test_app(state: AppState) -> Router {
    routes::build_app(state)
}

/// Helper to parse JSON response body
async fn parse_json_body(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn mock_grant(server: &mut ServerGuard, status: usize, hits: usize) -> Mock {
    server
        .mock("POST", GRANT_TOKEN_PATH)
        .with_status(status)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "statusCode": "0000",
                "statusMessage": "Successful",
                "id_token": "T1",
                "token_type": "Bearer",
                "expires_in": 3600,
                "refresh_token": "R1"
            })
            .to_string(),
        )
        .expect(hits)
        .create_async()
        .await
}

fn signed_webhook_request(body: &str, signature: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn notification_body(timestamp: i64) -> String {
    json!({
        "paymentID": "TR0011ABC",
        "trxID": "BFD90JRLST",
        "transactionStatus": "Completed",
        "amount": "500",
        "currency": "BDT",
        "merchantInvoiceNumber": "INV-42",
        "eventType": "payment.completed",
        "timestamp": timestamp
    })
    .to_string()
}

// ==================================================================================================
// Health Check Tests
// ==================================================================================================

#[tokio::test]
async fn test_root_endpoint() {
    let app = build_test_app(create_test_app_state("http://127.0.0.1:1"));

    let response = app
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_json_body(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "bKash Gateway is running");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_health_endpoint_healthy() {
    let mut server = mockito::Server::new_async().await;
    let grant = mock_grant(&mut server, 200, 1).await;
    let state = create_test_app_state(&server.url());
    let token_manager = state.token_manager.clone();
    let app = build_test_app(state);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_json_body(response.into_body()).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["token_state"], "fresh");
    assert!(body["token_updated_at"].is_string());
    assert!(body["timestamp"].is_string());

    assert_eq!(token_manager.token_state().await, TokenState::Fresh);
    grant.assert_async().await;
}

#[tokio::test]
async fn test_health_endpoint_unhealthy_when_grant_rejected() {
    let mut server = mockito::Server::new_async().await;
    let _grant = mock_grant(&mut server, 401, 1).await;
    let app = build_test_app(create_test_app_state(&server.url()));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = parse_json_body(response.into_body()).await;
    assert_eq!(body["status"], "unhealthy");
    assert!(body["error"].as_str().unwrap().contains("Grant token"));
}

// ==================================================================================================
// Webhook Tests
// ==================================================================================================

#[tokio::test]
async fn test_webhook_valid_signature() {
    let app = build_test_app(create_test_app_state("http://127.0.0.1:1"));
    let body = notification_body(Utc::now().timestamp());
    let signature = webhook::compute_signature(body.as_bytes(), APP_SECRET).unwrap();

    let response = app
        .oneshot(signed_webhook_request(&body, &signature))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_json_body(response.into_body()).await;
    assert_eq!(body["status"], "received");
    assert_eq!(body["paymentID"], "TR0011ABC");
}

#[tokio::test]
async fn test_webhook_signature_case_insensitive() {
    let app = build_test_app(create_test_app_state("http://127.0.0.1:1"));
    let body = notification_body(Utc::now().timestamp());
    let signature = webhook::compute_signature(body.as_bytes(), APP_SECRET)
        .unwrap()
        .to_ascii_uppercase();

    let response = app
        .oneshot(signed_webhook_request(&body, &signature))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_webhook_invalid_signature() {
    let app = build_test_app(create_test_app_state("http://127.0.0.1:1"));
    let body = notification_body(Utc::now().timestamp());
    let signature = webhook::compute_signature(body.as_bytes(), "another-secret").unwrap();

    let response = app
        .oneshot(signed_webhook_request(&body, &signature))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = parse_json_body(response.into_body()).await;
    assert_eq!(body["error"]["type"], "webhook_rejected");
}

#[tokio::test]
async fn test_webhook_stale_timestamp() {
    let app = build_test_app(create_test_app_state("http://127.0.0.1:1"));
    let body = notification_body(Utc::now().timestamp() - 400);
    let signature = webhook::compute_signature(body.as_bytes(), APP_SECRET).unwrap();

    let response = app
        .oneshot(signed_webhook_request(&body, &signature))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_webhook_malformed_json() {
    let app = build_test_app(create_test_app_state("http://127.0.0.1:1"));
    let body = "{not json";
    let signature = webhook::compute_signature(body.as_bytes(), APP_SECRET).unwrap();

    let response = app
        .oneshot(signed_webhook_request(body, &signature))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = parse_json_body(response.into_body()).await;
    assert_eq!(body["error"]["type"], "validation_error");
}

#[tokio::test]
async fn test_wrong_method() {
    let app = build_test_app(create_test_app_state("http://127.0.0.1:1"));

    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/webhook")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_unknown_endpoint() {
    let app = build_test_app(create_test_app_state("http://127.0.0.1:1"));

    let response = app
        .oneshot(Request::builder().uri("/v1/unknown").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ==================================================================================================
// Payment Flow Tests
// ==================================================================================================

#[tokio::test]
async fn test_create_then_execute_shares_one_grant() {
    let mut server = mockito::Server::new_async().await;
    let grant = mock_grant(&mut server, 200, 1).await;
    let create = server
        .mock("POST", CREATE_PAYMENT_PATH)
        .match_header("authorization", "T1")
        .with_status(200)
        .with_body(
            json!({
                "paymentID": "TR0011ABC",
                "bkashURL": "https://sandbox.payment.bkash.com/?paymentId=TR0011ABC",
                "statusCode": "0000",
                "statusMessage": "Successful"
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;
    let execute = server
        .mock("POST", EXECUTE_PAYMENT_PATH)
        .match_header("authorization", "T1")
        .with_status(200)
        .with_body(
            json!({
                "paymentID": "TR0011ABC",
                "trxID": "BFD90JRLST",
                "transactionStatus": "Completed",
                "amount": "500",
                "statusCode": "0000",
                "statusMessage": "Successful"
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let manager = Arc::new(TokenManager::new(test_config(&server.url())).unwrap());
    let client = PaymentClient::new(manager.clone()).unwrap();
    let cancel = CancellationToken::new();

    let request = CreatePaymentRequest::new(dec!(500), "INV-42", "https://shop.example/callback")
        .with_payer_reference("01770618575");
    let created = client.create_payment(&request, &cancel).await.unwrap();
    assert!(created.is_success());

    let executed = client
        .execute_payment(&created.payment_id, &cancel)
        .await
        .unwrap();
    assert!(executed.is_completed());
    assert_eq!(executed.trx_id, "BFD90JRLST");

    assert_eq!(manager.token_state().await, TokenState::Fresh);
    grant.assert_async().await;
    create.assert_async().await;
    execute.assert_async().await;
}
