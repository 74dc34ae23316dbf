//! Pool error types

use thiserror::Error;

/// Errors raised while building the pool or one of its clients.
///
/// These reach the caller of `ClientPool::get` unchanged. A failed
/// construction is never cached: the next lookup for the same key tries again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConstructionError {
    #[error("Missing GraphQL endpoint")]
    MissingEndpoint,

    #[error("Invalid endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    #[error("Invalid pool configuration: {0}")]
    InvalidConfig(String),

    #[error("Credential cannot be sent as a bearer token: {0}")]
    InvalidCredential(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("No Tokio runtime available to drive the idle sweeper")]
    NoRuntime,

    #[error("Client pool has been shut down")]
    PoolClosed,
}

/// A client failed to release its resources.
///
/// Only ever logged by the pool, never returned to callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to release client resources: {0}")]
pub struct ReleaseError(pub String);

impl ReleaseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
