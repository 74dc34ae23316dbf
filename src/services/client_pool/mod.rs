//! Client Pool Module
//!
//! This module keeps one logical client per credential so repeated callers
//! with the same credential share a client and its cache.
//!
//! # Features
//! - Credential-keyed pooling with an always-present anonymous client
//! - Background sweep that evicts clients idle past a threshold
//! - Explicit removal, clear-all and shutdown with per-client release
//! - A dispatch facade that routes each operation by its own context
//!
//! # Example
//! ```ignore
//! use orbitus::services::client_pool::{
//!     ClientPool, DispatchFacade, GraphqlClientFactory, PoolConfig,
//! };
//! use orbitus::services::graphql::GraphqlRequest;
//!
//! let pool = ClientPool::new(PoolConfig::new("https://cms.example.com"), GraphqlClientFactory)?;
//! let facade = DispatchFacade::new(Arc::new(pool));
//!
//! let me = facade
//!     .query(GraphqlRequest::new("{ users_me { id } }").with_token(token))
//!     .await?;
//! ```

mod dispatch;
mod factory;
mod key;
mod pool;
#[cfg(test)]
mod testing;

pub use dispatch::{DispatchError, DispatchFacade, Operation, OperationOutput};
pub use factory::{ClientConfig, ClientFactory, GraphqlClientFactory, LogicalClient};
pub use key::{derive_key, normalize_credential, PoolKey, ANONYMOUS_KEY};
pub use pool::{
    ClientPool, ClientSummary, PoolConfig, PoolStats, DEFAULT_IDLE_THRESHOLD_MS,
    DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SWEEP_INTERVAL_MS,
};

/// Pool of [`GraphqlClient`](crate::services::graphql::GraphqlClient)s
pub type GraphqlClientPool = ClientPool<GraphqlClientFactory>;

/// Facade over a [`GraphqlClientPool`]
pub type GraphqlDispatch = DispatchFacade<GraphqlClientFactory>;
