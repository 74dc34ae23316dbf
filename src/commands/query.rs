//! `orbitus query`: run one GraphQL document through the client pool

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use crate::config::Settings;
use crate::services::client_pool::{
    normalize_credential, ClientPool, DispatchFacade, GraphqlClientFactory, Operation,
    OperationOutput,
};
use crate::services::graphql::{CachePolicy, GraphqlRequest, OperationContext};

/// Arguments of `orbitus query`
#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    /// File holding the GraphQL document
    pub file: PathBuf,

    /// Variables as a JSON object
    #[arg(long)]
    pub variables: Option<String>,

    /// Operation to run when the document defines several
    #[arg(long)]
    pub operation_name: Option<String>,

    /// Bearer token (defaults to the configured admin_token)
    #[arg(long)]
    pub token: Option<String>,

    /// Use the system endpoint (/graphql/system)
    #[arg(long)]
    pub system: bool,

    /// Send the document as a mutation
    #[arg(long)]
    pub mutation: bool,

    /// Cache policy for this query
    #[arg(long, value_enum)]
    pub fetch_policy: Option<CachePolicy>,
}

/// Turn the arguments into an operation for the dispatch facade
pub fn build_operation(args: &QueryArgs, default_token: Option<&str>) -> Result<Operation> {
    let document = fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    if document.trim().is_empty() {
        anyhow::bail!("{} is empty", args.file.display());
    }

    let mut request = GraphqlRequest::new(document);
    if let Some(raw) = &args.variables {
        let variables: serde_json::Value =
            serde_json::from_str(raw).context("--variables is not valid JSON")?;
        if !variables.is_object() {
            anyhow::bail!("--variables must be a JSON object");
        }
        request = request.with_variables(variables);
    }
    if let Some(name) = &args.operation_name {
        request = request.with_operation_name(name.clone());
    }
    if let Some(policy) = args.fetch_policy {
        request = request.with_fetch_policy(policy);
    }

    let token = normalize_credential(args.token.as_deref()).or(default_token);
    request = request.with_context(OperationContext {
        token: token.map(str::to_string),
        system: args.system,
    });

    Ok(if args.mutation {
        Operation::Mutate(request)
    } else {
        Operation::Query(request)
    })
}

/// Run the query and return the GraphQL response body
///
/// The pool lives for this call only and is shut down before returning.
pub async fn run(settings: &Settings, args: &QueryArgs) -> Result<serde_json::Value> {
    let operation = build_operation(args, settings.admin_token())?;
    let pool = Arc::new(ClientPool::new(settings.pool_config()?, GraphqlClientFactory)?);
    let facade = DispatchFacade::new(Arc::clone(&pool));

    info!(
        file = %args.file.display(),
        operation = operation.name(),
        authenticated = operation.context().token.is_some(),
        system = args.system,
        "Running GraphQL document"
    );

    let result = facade.dispatch(operation).await;
    pool.shutdown();

    match result? {
        OperationOutput::Response(response) => Ok(serde_json::to_value(response)?),
        OperationOutput::Cleared => Ok(serde_json::Value::Null),
    }
}
