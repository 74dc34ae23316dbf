//! GraphQL client module
//!
//! The concrete logical client handed out by the client pool: a GraphQL
//! over HTTP client bound to one credential, with an in-memory response
//! cache governed by a [`CachePolicy`].

mod cache;
mod client;
mod error;
mod operation;
mod policy;

pub use cache::{CacheKey, ResponseCache};
pub use client::GraphqlClient;
pub use error::{GraphqlClientError, GraphqlError, GraphqlErrorLocation, GraphqlPathSegment};
pub use operation::{GraphqlRequest, GraphqlResponse, OperationContext};
pub use policy::{CachePolicy, CredentialMode};
