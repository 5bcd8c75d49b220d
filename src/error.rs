// Error handling module
// Defines the gateway error taxonomy and HTTP response conversion

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the bKash client library and the service routes
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or missing startup configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Grant or refresh rejected by the gateway, or the auth call failed in transit
    #[error("Authentication failed: {message}")]
    Authentication {
        message: String,
        status: Option<u16>,
    },

    /// Malformed input to a public operation
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A payment operation failed downstream
    #[error("Payment operation failed [{code}]: {message}")]
    Operation {
        code: String,
        message: String,
        status: Option<u16>,
    },

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// Inbound webhook failed signature or replay checks
    #[error("Webhook rejected: {0}")]
    WebhookRejected(String),
}

impl Error {
    pub(crate) fn auth(message: impl Into<String>, status: Option<u16>) -> Self {
        Error::Authentication {
            message: message.into(),
            status,
        }
    }

    pub(crate) fn operation(
        code: impl Into<String>,
        message: impl Into<String>,
        status: Option<u16>,
    ) -> Self {
        Error::Operation {
            code: code.into(),
            message: message.into(),
            status,
        }
    }

    /// True when the caller may clear the token cache and retry once
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, Error::Authentication { .. })
    }

    /// HTTP status reported by the gateway, when there was one
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Error::Authentication { status, .. } | Error::Operation { status, .. } => *status,
            _ => None,
        }
    }

    /// Attach a swallowed refresh failure to a grant failure
    pub(crate) fn after_refresh_failure(self, refresh_error: &Error) -> Self {
        match self {
            Error::Authentication { message, status } => Error::Authentication {
                message: format!("{} (preceding refresh also failed: {})", message, refresh_error),
                status,
            },
            other => other,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Configuration(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::Authentication { .. } => (StatusCode::BAD_GATEWAY, "auth_error"),
            Error::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            Error::Operation { .. } => (StatusCode::BAD_GATEWAY, "operation_error"),
            Error::Cancelled => (StatusCode::SERVICE_UNAVAILABLE, "cancelled"),
            Error::WebhookRejected(_) => (StatusCode::UNAUTHORIZED, "webhook_rejected"),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "type": error_type,
            }
        }));

        (status, body).into_response()
    }
}

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;
