// In-memory credential store

use chrono::{DateTime, Utc};

use super::types::CredentialRecord;

/// Holds the cached credential record.
///
/// Not synchronized on its own: the token manager keeps it behind a mutex
/// and only touches it while holding that lock.
#[derive(Debug, Default)]
pub struct CredentialStore {
    record: CredentialRecord,
    last_updated: Option<DateTime<Utc>>,
}

impl CredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the current record (may be empty)
    pub fn read(&self) -> CredentialRecord {
        self.record.clone()
    }

    /// Replace token, refresh token and expiry together
    pub fn write(&mut self, id_token: String, refresh_token: String, expires_at: DateTime<Utc>) {
        self.record = CredentialRecord {
            id_token,
            refresh_token,
            expires_at,
        };
        self.last_updated = Some(Utc::now());
    }

    /// Reset to the empty record
    pub fn clear(&mut self) {
        self.record = CredentialRecord::empty();
        self.last_updated = Some(Utc::now());
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }
}
