//! GraphQL request/response types and the per-operation context

use serde::{Deserialize, Serialize};

use super::error::{GraphqlClientError, GraphqlError};
use super::policy::CachePolicy;

/// Per-operation context
///
/// Carries the caller's credential, which decides the pooled client that
/// serves the operation, and the endpoint selection flag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationContext {
    /// Bearer credential; `None` means anonymous access
    pub token: Option<String>,
    /// Route to the system endpoint (`/graphql/system`) instead of `/graphql`
    pub system: bool,
}

impl OperationContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            system: false,
        }
    }

    /// Target the system endpoint
    pub fn system(mut self) -> Self {
        self.system = true;
        self
    }
}

/// A GraphQL query or mutation
///
/// Serializes to the GraphQL-over-HTTP body; the context and fetch policy
/// stay local.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphqlRequest {
    pub query: String,
    pub variables: serde_json::Value,
    #[serde(rename = "operationName", skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
    #[serde(skip)]
    pub context: OperationContext,
    /// Overrides the client's default cache policy for this request
    #[serde(skip)]
    pub fetch_policy: Option<CachePolicy>,
}

impl GraphqlRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: serde_json::Value::Object(serde_json::Map::new()),
            operation_name: None,
            context: OperationContext::default(),
            fetch_policy: None,
        }
    }

    pub fn with_variables(mut self, variables: serde_json::Value) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    pub fn with_context(mut self, context: OperationContext) -> Self {
        self.context = context;
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.context.token = Some(token.into());
        self
    }

    pub fn system(mut self) -> Self {
        self.context.system = true;
        self
    }

    pub fn with_fetch_policy(mut self, policy: CachePolicy) -> Self {
        self.fetch_policy = Some(policy);
        self
    }

    /// Name used in logs and cache-miss errors
    pub fn display_name(&self) -> &str {
        self.operation_name.as_deref().unwrap_or("anonymous operation")
    }
}

/// A GraphQL response body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphqlResponse {
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphqlError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

impl GraphqlResponse {
    /// Returns `true` if the server reported no GraphQL errors
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Take the data payload, treating GraphQL errors as a failure
    pub fn into_data(self) -> Result<serde_json::Value, GraphqlClientError> {
        if !self.errors.is_empty() {
            return Err(GraphqlClientError::GraphqlErrors(self.errors));
        }
        self.data.ok_or(GraphqlClientError::MissingData)
    }
}
