// Authentication module
// Manages the gateway token lifecycle

mod manager;
mod store;
mod types;

pub mod gateway;

pub(crate) use manager::cancellable;
pub use manager::TokenManager;
pub use store::CredentialStore;
pub use types::{
    AuthResult, CredentialRecord, TokenState, DEFAULT_EXPIRES_IN_SECS, MAX_EXPIRES_IN_SECS,
    SUCCESS_STATUS_CODE,
};
