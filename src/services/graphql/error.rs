//! GraphQL client errors

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::truncate_with_suffix;

/// Longest response body kept in an HTTP status error
const MAX_ERROR_BODY_CHARS: usize = 2048;

/// Location of a GraphQL error inside the query document (1-based)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphqlErrorLocation {
    pub line: u32,
    pub column: u32,
}

/// One segment of a GraphQL error path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphqlPathSegment {
    Key(String),
    Index(i64),
}

/// An entry of the `errors` array of a GraphQL response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<GraphqlErrorLocation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<GraphqlPathSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

/// Errors raised by [`GraphqlClient`](super::GraphqlClient) operations
///
/// The pool and the dispatch facade hand these back to callers untouched.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphqlClientError {
    #[error("HTTP request failed: {message}")]
    Http {
        message: String,
        status: Option<u16>,
        timeout: bool,
    },

    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Json(String),

    #[error("GraphQL errors: {}", summarize(.0))]
    GraphqlErrors(Vec<GraphqlError>),

    #[error("Response contained no data")]
    MissingData,

    #[error("No cached result for {operation} under cache-only policy")]
    CacheMiss { operation: String },
}

impl GraphqlClientError {
    pub(crate) fn http_status(status: u16, body: &[u8]) -> Self {
        let body = String::from_utf8_lossy(body);
        Self::HttpStatus {
            status,
            body: truncate_with_suffix(&body, MAX_ERROR_BODY_CHARS, "…"),
        }
    }
}

impl From<reqwest::Error> for GraphqlClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http {
            message: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
            timeout: err.is_timeout(),
        }
    }
}

impl From<serde_json::Error> for GraphqlClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

fn summarize(errors: &[GraphqlError]) -> String {
    match errors {
        [] => "unknown error".to_string(),
        [only] => only.message.clone(),
        [first, rest @ ..] => format!("{} (and {} more)", first.message, rest.len()),
    }
}
