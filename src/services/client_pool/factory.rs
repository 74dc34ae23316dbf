//! Logical client capability and client construction
//!
//! The pool is generic over a [`ClientFactory`]; whatever it builds must
//! implement [`LogicalClient`], the closed set of operations the dispatch
//! facade can forward.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use crate::error::{ConstructionError, ReleaseError};
use crate::services::graphql::{
    CachePolicy, CredentialMode, GraphqlClient, GraphqlRequest, GraphqlResponse,
};
use crate::utils::redact_secret;

// ============================================================================
// Client Configuration
// ============================================================================

/// Everything a factory needs to build one client
#[derive(Clone)]
pub struct ClientConfig {
    /// Base endpoint, e.g. `https://cms.example.com`
    pub endpoint: String,
    /// Credential the client is bound to
    pub credential: Option<String>,
    /// Default cache policy for queries
    pub cache_policy: CachePolicy,
    /// Whether the credential is forwarded with requests
    pub credential_mode: CredentialMode,
    /// Per-request timeout
    pub timeout: Duration,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("endpoint", &self.endpoint)
            .field("credential", &self.credential.as_deref().map(redact_secret))
            .field("cache_policy", &self.cache_policy)
            .field("credential_mode", &self.credential_mode)
            .field("timeout", &self.timeout)
            .finish()
    }
}

// ============================================================================
// Logical Client Trait
// ============================================================================

/// Operations a pooled client supports
#[async_trait]
pub trait LogicalClient: Send + Sync + 'static {
    /// Error returned by forwarded operations, passed through unchanged
    type Error: std::error::Error + Send + Sync + 'static;

    async fn query(&self, request: GraphqlRequest) -> Result<GraphqlResponse, Self::Error>;

    async fn mutate(&self, request: GraphqlRequest) -> Result<GraphqlResponse, Self::Error>;

    /// Drop cached results while keeping the client usable
    async fn clear_cache(&self) -> Result<(), Self::Error>;

    /// Free the client's resources before the pool drops it
    ///
    /// Called on eviction, removal, clear-all and shutdown. Must not block.
    fn release(&self) -> Result<(), ReleaseError>;
}

// ============================================================================
// Client Factory
// ============================================================================

/// Builds clients for the pool
///
/// Implementations hold no per-call state; every call is independent.
/// `create` runs while the pool lock is held, so it must not block or wait
/// on I/O.
pub trait ClientFactory: Send + Sync + 'static {
    type Client: LogicalClient;

    fn create(&self, config: &ClientConfig) -> Result<Self::Client, ConstructionError>;
}

/// Factory for [`GraphqlClient`]
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphqlClientFactory;

impl ClientFactory for GraphqlClientFactory {
    type Client = GraphqlClient;

    fn create(&self, config: &ClientConfig) -> Result<GraphqlClient, ConstructionError> {
        GraphqlClient::new(config)
    }
}
