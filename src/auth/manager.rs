use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;

use super::gateway;
use super::store::CredentialStore;
use super::types::{AuthResult, TokenState};
use crate::config::GatewayConfig;
use crate::error::{Error, Result};

/// Token manager
///
/// Single source of truth for the bearer token of one gateway account.
/// The whole read-decide-refresh/grant-write sequence runs under one mutex,
/// so at most one grant or refresh is in flight per manager and callers
/// that waited on the lock reuse the token the previous holder cached.
pub struct TokenManager {
    /// Cached credential record
    store: Mutex<CredentialStore>,

    /// Application credentials (read-only after startup)
    config: Arc<GatewayConfig>,

    /// HTTP client for grant/refresh requests
    client: Client,

    /// Safety margin before expiry
    refresh_buffer: Duration,
}

impl TokenManager {
    /// Create a token manager; invalid configuration is rejected here
    pub fn new(config: Arc<GatewayConfig>) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| Error::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Self::with_client(config, client)
    }

    /// Create a token manager around a prepared HTTP client
    pub fn with_client(config: Arc<GatewayConfig>, client: Client) -> Result<Self> {
        config.validate()?;

        let refresh_buffer = config.refresh_buffer();
        Ok(Self {
            store: Mutex::new(CredentialStore::new()),
            config,
            client,
            refresh_buffer,
        })
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Get a valid id token, refreshing or granting if necessary
    pub async fn get_valid_token(&self, cancel: &CancellationToken) -> Result<String> {
        let mut store = self.lock(cancel).await?;

        let record = store.read();
        match record.state(Utc::now(), self.refresh_buffer) {
            TokenState::Fresh => {
                tracing::debug!("Using cached bKash token");
                return Ok(record.id_token);
            }
            TokenState::Stale => {
                tracing::debug!(
                    expires_at = %record.expires_at.to_rfc3339(),
                    "Cached bKash token is expiring"
                );
            }
            TokenState::Empty => {
                tracing::debug!("No cached bKash token");
            }
        }

        let mut refresh_failure = None;

        if !record.refresh_token.is_empty() {
            let attempt = cancellable(
                cancel,
                gateway::refresh(&self.client, &self.config, &record.refresh_token),
            )
            .await;

            match attempt {
                Ok(result) => {
                    return self.cache_token(&mut store, result, &record.refresh_token);
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Token refresh failed, will request new grant token"
                    );
                    // The refresh token may be permanently dead; never retry it
                    store.clear();
                    refresh_failure = Some(e);
                }
            }
        }

        match cancellable(cancel, gateway::grant(&self.client, &self.config)).await {
            Ok(result) => self.cache_token(&mut store, result, ""),
            Err(e) => {
                tracing::error!(error = %e, "Failed to grant bKash token");
                Err(match refresh_failure {
                    Some(refresh_error) => e.after_refresh_failure(&refresh_error),
                    None => e,
                })
            }
        }
    }

    /// Drop the cached token so the next call performs a fresh grant
    pub async fn clear_cache(&self) {
        self.store.lock().await.clear();
        tracing::info!("bKash token cache cleared");
    }

    /// Drop the cached token only if it is still `rejected_token`.
    ///
    /// A caller holding a token the gateway refused uses this so that a
    /// token another caller already renewed is kept.
    pub async fn clear_cache_if(&self, rejected_token: &str) -> bool {
        let mut store = self.store.lock().await;
        if store.read().id_token != rejected_token {
            tracing::debug!("Rejected bKash token was already replaced");
            return false;
        }
        store.clear();
        tracing::info!("bKash token cache cleared after rejection");
        true
    }

    /// When the cached record last changed
    pub async fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.store.lock().await.last_updated()
    }

    /// Current lifecycle state of the cached token
    pub async fn token_state(&self) -> TokenState {
        self.store
            .lock()
            .await
            .read()
            .state(Utc::now(), self.refresh_buffer)
    }

    async fn lock(&self, cancel: &CancellationToken) -> Result<MutexGuard<'_, CredentialStore>> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::Cancelled),
            guard = self.store.lock() => Ok(guard),
        }
    }

    fn cache_token(
        &self,
        store: &mut CredentialStore,
        result: AuthResult,
        previous_refresh_token: &str,
    ) -> Result<String> {
        let expires_in = result.expires_in_or_default();
        let expires_at = Duration::try_seconds(expires_in)
            .and_then(|lifetime| Utc::now().checked_add_signed(lifetime))
            .ok_or_else(|| {
                Error::auth(
                    format!("Token lifetime of {}s is out of range", expires_in),
                    None,
                )
            })?;
        let refresh_token = result
            .refresh_token
            .unwrap_or_else(|| previous_refresh_token.to_string());

        store.write(result.id_token.clone(), refresh_token, expires_at);

        tracing::info!(
            expires_at = %expires_at.to_rfc3339(),
            "Cached bKash token"
        );

        Ok(result.id_token)
    }
}

/// Run a gateway call unless the caller cancels first; the in-flight request
/// is dropped on cancellation
pub(crate) async fn cancellable<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = call => result,
    }
}
