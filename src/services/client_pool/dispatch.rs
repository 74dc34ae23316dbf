//! Dispatch facade
//!
//! Single entry point for callers: each operation carries its own context,
//! the facade picks the pooled client for the context's credential and
//! forwards the call to it. Client errors come back untouched.

use std::sync::Arc;
use tracing::debug;

use super::factory::{ClientFactory, LogicalClient};
use super::pool::ClientPool;
use crate::error::ConstructionError;
use crate::services::graphql::{GraphqlRequest, GraphqlResponse, OperationContext};

/// An operation routed through the facade
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    Query(GraphqlRequest),
    Mutate(GraphqlRequest),
    ClearCache(OperationContext),
}

impl Operation {
    pub fn context(&self) -> &OperationContext {
        match self {
            Operation::Query(request) | Operation::Mutate(request) => &request.context,
            Operation::ClearCache(context) => context,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Query(_) => "query",
            Operation::Mutate(_) => "mutate",
            Operation::ClearCache(_) => "clear_cache",
        }
    }
}

/// Result of a dispatched operation
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutput {
    Response(GraphqlResponse),
    Cleared,
}

impl OperationOutput {
    pub fn into_response(self) -> Option<GraphqlResponse> {
        match self {
            OperationOutput::Response(response) => Some(response),
            OperationOutput::Cleared => None,
        }
    }
}

/// Failure of a dispatched operation
#[derive(Debug, thiserror::Error)]
pub enum DispatchError<E> {
    /// No client could be obtained for the operation's credential
    #[error("Client unavailable: {0}")]
    Construction(#[from] ConstructionError),

    /// The client's own error, unchanged
    #[error(transparent)]
    Client(E),
}

type ClientError<F> = <<F as ClientFactory>::Client as LogicalClient>::Error;

/// Routes operations to pooled clients by credential
pub struct DispatchFacade<F: ClientFactory> {
    pool: Arc<ClientPool<F>>,
}

impl<F: ClientFactory> Clone for DispatchFacade<F> {
    fn clone(&self) -> Self {
        Self {
            pool: Arc::clone(&self.pool),
        }
    }
}

impl<F: ClientFactory> DispatchFacade<F> {
    pub fn new(pool: Arc<ClientPool<F>>) -> Self {
        Self { pool }
    }

    /// Run an operation on the client bound to its context's credential
    pub async fn dispatch(
        &self,
        operation: Operation,
    ) -> Result<OperationOutput, DispatchError<ClientError<F>>> {
        let client = self.pool.get(operation.context().token.as_deref())?;
        debug!(
            operation = operation.name(),
            system = operation.context().system,
            "Dispatching operation"
        );

        let output = match operation {
            Operation::Query(request) => OperationOutput::Response(
                client.query(request).await.map_err(DispatchError::Client)?,
            ),
            Operation::Mutate(request) => OperationOutput::Response(
                client.mutate(request).await.map_err(DispatchError::Client)?,
            ),
            Operation::ClearCache(_) => {
                client.clear_cache().await.map_err(DispatchError::Client)?;
                OperationOutput::Cleared
            }
        };
        Ok(output)
    }

    pub async fn query(
        &self,
        request: GraphqlRequest,
    ) -> Result<GraphqlResponse, DispatchError<ClientError<F>>> {
        let client = self.pool.get(request.context.token.as_deref())?;
        client.query(request).await.map_err(DispatchError::Client)
    }

    pub async fn mutate(
        &self,
        request: GraphqlRequest,
    ) -> Result<GraphqlResponse, DispatchError<ClientError<F>>> {
        let client = self.pool.get(request.context.token.as_deref())?;
        client.mutate(request).await.map_err(DispatchError::Client)
    }

    /// Clear the cache of the client bound to the context's credential
    pub async fn clear_cache(
        &self,
        context: &OperationContext,
    ) -> Result<(), DispatchError<ClientError<F>>> {
        let client = self.pool.get(context.token.as_deref())?;
        client.clear_cache().await.map_err(DispatchError::Client)
    }

    /// Drop the pooled client for a credential
    pub fn remove(&self, credential: Option<&str>) -> bool {
        self.pool.remove(credential)
    }

    /// Drop every pooled client except the anonymous one
    pub fn clear_all(&self) -> usize {
        self.pool.clear_all()
    }

    pub fn pool(&self) -> &Arc<ClientPool<F>> {
        &self.pool
    }
}
