// Grant and refresh calls against the tokenized checkout auth endpoints

use reqwest::Client;
use serde::Serialize;

use super::types::{AuthResponse, AuthResult, GrantTokenRequest, RefreshTokenRequest};
use crate::config::GatewayConfig;
use crate::error::{Error, Result};

pub const GRANT_TOKEN_PATH: &str = "/v1.2.0-beta/tokenized/checkout/token/grant";
pub const REFRESH_TOKEN_PATH: &str = "/v1.2.0-beta/tokenized/checkout/token/refresh";

/// Exchange the primary credentials for a new id token
pub async fn grant(client: &Client, config: &GatewayConfig) -> Result<AuthResult> {
    tracing::info!("Requesting bKash grant token...");

    let request = GrantTokenRequest {
        app_key: &config.app_key,
        app_secret: &config.app_secret,
    };

    send_auth_request(client, config, GRANT_TOKEN_PATH, &request, "Grant token").await
}

/// Exchange a refresh token for a new id token
pub async fn refresh(
    client: &Client,
    config: &GatewayConfig,
    refresh_token: &str,
) -> Result<AuthResult> {
    if refresh_token.trim().is_empty() {
        return Err(Error::InvalidArgument(
            "Refresh token cannot be empty".to_string(),
        ));
    }

    tracing::info!("Refreshing bKash token...");

    let request = RefreshTokenRequest {
        app_key: &config.app_key,
        app_secret: &config.app_secret,
        refresh_token,
    };

    send_auth_request(client, config, REFRESH_TOKEN_PATH, &request, "Refresh token").await
}

async fn send_auth_request<B: Serialize>(
    client: &Client,
    config: &GatewayConfig,
    path: &str,
    body: &B,
    operation: &str,
) -> Result<AuthResult> {
    let url = config.endpoint(path);

    let response = client
        .post(&url)
        .header("Accept", "application/json")
        .header("username", &config.username)
        .header("password", &config.password)
        .json(body)
        .send()
        .await
        .map_err(|e| {
            let error_kind = transport_error_kind(&e);
            tracing::error!(
                error_kind = error_kind,
                error = %e,
                url = %url,
                "{} request could not be sent",
                operation
            );
            Error::auth(
                format!("{} request failed: {} (kind: {})", operation, e, error_kind),
                None,
            )
        })?;

    let status = response.status();
    let body = response.text().await.map_err(|e| {
        Error::auth(
            format!("{} response could not be read: {}", operation, e),
            Some(status.as_u16()),
        )
    })?;

    if !status.is_success() {
        tracing::error!(
            status = status.as_u16(),
            response_body = %body,
            "bKash {} failed",
            operation.to_lowercase()
        );
        return Err(Error::auth(
            format!("{} request failed: {}", operation, status),
            Some(status.as_u16()),
        ));
    }

    let data: AuthResponse = serde_json::from_str(&body).map_err(|e| {
        Error::auth(
            format!("Failed to parse {} response: {}", operation.to_lowercase(), e),
            Some(status.as_u16()),
        )
    })?;

    if !data.is_success() {
        tracing::error!(
            status_code = %data.status_code,
            status_message = %data.status_message,
            "bKash {} rejected",
            operation.to_lowercase()
        );
        return Err(Error::auth(
            format!("{} failed: {}", operation, data.status_message_or_unknown()),
            None,
        ));
    }

    if data.id_token.is_empty() {
        return Err(Error::auth(
            format!("{} response does not contain id_token", operation),
            None,
        ));
    }

    let result = AuthResult::from(data);
    tracing::debug!(
        token_type = %result.token_type,
        expires_in = result.expires_in_or_default(),
        "{} succeeded",
        operation
    );

    Ok(result)
}

/// Categorize a transport error for logging
pub(crate) fn transport_error_kind(e: &reqwest::Error) -> &'static str {
    if e.is_timeout() {
        "timeout"
    } else if e.is_connect() {
        "connection_failed"
    } else if e.is_request() {
        "request_error"
    } else if e.is_body() {
        "body_error"
    } else if e.is_decode() {
        "decode_error"
    } else {
        "unknown"
    }
}
