//! Services module
//!
//! Contains the client pool and the GraphQL client it manages.

pub mod client_pool;
pub mod graphql;

pub use client_pool::{
    ClientFactory, ClientPool, DispatchError, DispatchFacade, GraphqlClientFactory,
    GraphqlClientPool, GraphqlDispatch, LogicalClient, Operation, OperationOutput, PoolConfig,
    PoolStats,
};
pub use graphql::{
    CachePolicy, CredentialMode, GraphqlClient, GraphqlClientError, GraphqlRequest,
    GraphqlResponse, OperationContext,
};
