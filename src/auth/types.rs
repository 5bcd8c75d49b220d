// Authentication types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Business status code the gateway returns on success
pub const SUCCESS_STATUS_CODE: &str = "0000";

/// Token lifetime assumed when the gateway omits `expires_in`
pub const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// Upper bound applied to a gateway-reported lifetime (30 days)
pub const MAX_EXPIRES_IN_SECS: i64 = 30 * 24 * 3600;

/// Cached authentication state; the three fields always change together
#[derive(Debug, Clone, PartialEq)]
pub struct CredentialRecord {
    pub id_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CredentialRecord {
    pub fn empty() -> Self {
        Self {
            id_token: String::new(),
            refresh_token: String::new(),
            expires_at: DateTime::<Utc>::MIN_UTC,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.id_token.is_empty()
    }

    /// Classify the record against `now` and the refresh buffer
    pub fn state(&self, now: DateTime<Utc>, refresh_buffer: Duration) -> TokenState {
        if self.id_token.is_empty() {
            TokenState::Empty
        } else {
            // A buffer past the end of time can never leave the token fresh
            match now.checked_add_signed(refresh_buffer) {
                Some(deadline) if deadline < self.expires_at => TokenState::Fresh,
                _ => TokenState::Stale,
            }
        }
    }
}

impl Default for CredentialRecord {
    fn default() -> Self {
        Self::empty()
    }
}

/// Lifecycle state of a cached token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
    /// No token has been granted (or the cache was cleared)
    Empty,
    /// Token is usable and outside the refresh buffer
    Fresh,
    /// Token is within the refresh buffer or already expired
    Stale,
}

/// Parsed result of a successful grant or refresh
#[derive(Debug, Clone, PartialEq)]
pub struct AuthResult {
    pub id_token: String,
    pub token_type: String,
    /// New refresh token, when the gateway issued one
    pub refresh_token: Option<String>,
    /// Lifetime in seconds, when the gateway reported a positive one
    pub expires_in: Option<i64>,
}

impl AuthResult {
    pub fn expires_in_or_default(&self) -> i64 {
        self.expires_in
            .filter(|secs| *secs > 0)
            .map(|secs| secs.min(MAX_EXPIRES_IN_SECS))
            .unwrap_or(DEFAULT_EXPIRES_IN_SECS)
    }
}

/// Grant token request body
#[derive(Serialize)]
pub struct GrantTokenRequest<'a> {
    pub app_key: &'a str,
    pub app_secret: &'a str,
}

/// Refresh token request body
#[derive(Serialize)]
pub struct RefreshTokenRequest<'a> {
    pub app_key: &'a str,
    pub app_secret: &'a str,
    pub refresh_token: &'a str,
}

/// Grant/refresh response body
#[derive(Debug, Default, Deserialize)]
pub struct AuthResponse {
    #[serde(rename = "statusCode", default)]
    pub status_code: String,
    #[serde(rename = "statusMessage", default)]
    pub status_message: String,
    #[serde(default)]
    pub id_token: String,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl AuthResponse {
    pub fn is_success(&self) -> bool {
        self.status_code == SUCCESS_STATUS_CODE
    }

    pub fn status_message_or_unknown(&self) -> &str {
        if self.status_message.is_empty() {
            "Unknown error"
        } else {
            &self.status_message
        }
    }
}

impl From<AuthResponse> for AuthResult {
    fn from(response: AuthResponse) -> Self {
        AuthResult {
            id_token: response.id_token,
            token_type: response.token_type,
            refresh_token: response.refresh_token.filter(|t| !t.is_empty()),
            expires_in: response.expires_in,
        }
    }
}
