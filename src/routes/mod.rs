use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::TokenManager;
use crate::error::Error;
use crate::webhook;

/// Application version from Cargo.toml
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Header carrying the base64 HMAC of the webhook body
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub token_manager: Arc<TokenManager>,
    pub webhook_tolerance_secs: u64,
    /// Cancelled when the server begins shutting down
    pub shutdown: CancellationToken,
}

/// Health check routes
pub fn health_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Inbound payment notifications
pub fn webhook_routes(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook_handler))
        .with_state(state)
}

/// Build the application with all routes and middleware
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(health_routes(state.clone()))
        .merge(webhook_routes(state))
        .layer(TraceLayer::new_for_http())
}

/// GET / - Simple liveness check
async fn root_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "message": "bKash Gateway is running",
        "version": VERSION
    }))
}

/// GET /health - Gateway reachability
///
/// Acquires a token through the manager, so a cold or stale cache is
/// renewed here. Reports 503 when the gateway cannot issue one.
async fn health_handler(State(state): State<AppState>) -> Response {
    match state.token_manager.get_valid_token(&state.shutdown).await {
        Ok(_) => {
            let token_state = state.token_manager.token_state().await;
            let token_updated_at = state
                .token_manager
                .last_updated()
                .await
                .map(|at| at.to_rfc3339());
            Json(json!({
                "status": "healthy",
                "token_state": token_state,
                "token_updated_at": token_updated_at,
                "timestamp": Utc::now().to_rfc3339(),
                "version": VERSION
            }))
            .into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not obtain a bKash token");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unhealthy",
                    "error": e.to_string(),
                    "timestamp": Utc::now().to_rfc3339()
                })),
            )
                .into_response()
        }
    }
}

/// POST /webhook - Signed payment notification
async fn webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, Error> {
    let request_id = Uuid::new_v4();

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if signature.is_empty() {
        tracing::warn!(request_id = %request_id, "Webhook without signature header");
        return Err(Error::WebhookRejected(format!(
            "missing {} header",
            SIGNATURE_HEADER
        )));
    }

    let notification = webhook::verify_notification(
        &body,
        signature,
        &state.token_manager.config().app_secret,
        state.webhook_tolerance_secs,
    )
    .inspect_err(|e| {
        tracing::warn!(request_id = %request_id, error = %e, "Webhook rejected");
    })?;

    tracing::info!(
        request_id = %request_id,
        payment_id = %notification.payment_id,
        trx_id = %notification.trx_id,
        transaction_status = %notification.transaction_status,
        event_type = %notification.event_type,
        "Webhook received"
    );

    Ok(Json(json!({
        "status": "received",
        "paymentID": notification.payment_id
    })))
}
