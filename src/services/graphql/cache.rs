//! In-memory response cache owned by one client

use moka::sync::Cache;
use std::fmt;
use std::time::Duration;

use super::operation::{GraphqlRequest, GraphqlResponse};

/// Identity of a cached response
///
/// Variables are keyed by their serialized form; `serde_json` maps are
/// ordered, so equal variable objects produce equal keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    system: bool,
    operation_name: Option<String>,
    query: String,
    variables: String,
}

impl CacheKey {
    pub fn for_request(request: &GraphqlRequest) -> Self {
        Self {
            system: request.context.system,
            operation_name: request.operation_name.clone(),
            query: request.query.clone(),
            variables: request.variables.to_string(),
        }
    }
}

/// Default number of responses a client keeps
pub const DEFAULT_CACHE_CAPACITY: u64 = 1_000;

/// Cached responses unread for this long are dropped (10 minutes)
pub const DEFAULT_CACHE_TIME_TO_IDLE: Duration = Duration::from_secs(600);

/// Bounded response cache
#[derive(Clone)]
pub struct ResponseCache {
    entries: Cache<CacheKey, GraphqlResponse>,
}

impl ResponseCache {
    /// Create a cache with the default capacity and idle expiry
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TIME_TO_IDLE)
    }

    pub fn with_limits(max_capacity: u64, time_to_idle: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_idle(time_to_idle)
            .build();
        Self { entries }
    }

    pub fn get(&self, key: &CacheKey) -> Option<GraphqlResponse> {
        self.entries.get(key)
    }

    pub fn insert(&self, key: CacheKey, response: GraphqlResponse) {
        self.entries.insert(key, response);
    }

    /// Drop every cached response, returning how many were held
    pub fn clear(&self) -> usize {
        let count = self.len();
        self.entries.invalidate_all();
        self.entries.run_pending_tasks();
        count
    }

    pub fn len(&self) -> usize {
        // Entry counts settle once pending evictions have run
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("entries", &self.entries.entry_count())
            .finish()
    }
}
