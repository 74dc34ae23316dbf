//! Client Pool Implementation
//!
//! This module provides the `ClientPool`, which keeps one logical client per
//! credential, hands the same instance to every caller presenting that
//! credential, and evicts clients that stay idle past a threshold.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::factory::{ClientConfig, ClientFactory, LogicalClient};
use super::key::{normalize_credential, PoolKey};
use crate::error::ConstructionError;
use crate::services::graphql::{CachePolicy, CredentialMode};

/// Default idle threshold (30 minutes)
pub const DEFAULT_IDLE_THRESHOLD_MS: u64 = 30 * 60 * 1000;

/// Default sweep interval (5 minutes)
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 5 * 60 * 1000;

/// Default per-request timeout of pooled clients
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// Pool Configuration
// ============================================================================

/// Pool-wide configuration, captured when the pool is built
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Base endpoint every client talks to
    pub endpoint: String,
    /// Minimum time since last use before a client may be evicted
    pub idle_threshold: Duration,
    /// Period of the background sweep
    pub sweep_interval: Duration,
    /// Cache policy given to new clients
    pub default_cache_policy: CachePolicy,
    /// Credential forwarding mode given to new clients
    pub credential_mode: CredentialMode,
    /// Per-request timeout given to new clients
    pub request_timeout: Duration,
}

impl PoolConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            idle_threshold: Duration::from_millis(DEFAULT_IDLE_THRESHOLD_MS),
            sweep_interval: Duration::from_millis(DEFAULT_SWEEP_INTERVAL_MS),
            default_cache_policy: CachePolicy::default(),
            credential_mode: CredentialMode::default(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }

    pub fn with_idle_threshold(mut self, threshold: Duration) -> Self {
        self.idle_threshold = threshold;
        self
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn with_cache_policy(mut self, policy: CachePolicy) -> Self {
        self.default_cache_policy = policy;
        self
    }

    pub fn with_credential_mode(mut self, mode: CredentialMode) -> Self {
        self.credential_mode = mode;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn validate(&self) -> Result<(), ConstructionError> {
        if self.endpoint.trim().is_empty() {
            return Err(ConstructionError::MissingEndpoint);
        }
        if self.sweep_interval.is_zero() {
            return Err(ConstructionError::InvalidConfig(
                "sweep interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    fn client_config(&self, credential: Option<&str>) -> ClientConfig {
        ClientConfig {
            endpoint: self.endpoint.clone(),
            credential: credential.map(str::to_string),
            cache_policy: self.default_cache_policy,
            credential_mode: self.credential_mode,
            timeout: self.request_timeout,
        }
    }
}

// ============================================================================
// Pool Entries
// ============================================================================

struct PoolEntry<C> {
    client: Arc<C>,
    last_used_at: Instant,
    created_at: DateTime<Utc>,
}

impl<C> PoolEntry<C> {
    fn new(client: Arc<C>, now: Instant) -> Self {
        Self {
            client,
            last_used_at: now,
            created_at: Utc::now(),
        }
    }

    /// Record a use; never moves the timestamp backwards
    fn touch(&mut self, now: Instant) {
        if now > self.last_used_at {
            self.last_used_at = now;
        }
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_used_at)
    }
}

struct Entries<C> {
    map: HashMap<PoolKey, PoolEntry<C>>,
    closed: bool,
}

/// State shared between the pool handle and its sweeper task
struct PoolState<F: ClientFactory> {
    config: PoolConfig,
    factory: F,
    entries: Mutex<Entries<F::Client>>,
}

impl<F: ClientFactory> PoolState<F> {
    fn lock(&self) -> MutexGuard<'_, Entries<F::Client>> {
        // Entries stay consistent even if a factory panicked mid-lookup
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn get(&self, credential: Option<&str>) -> Result<Arc<F::Client>, ConstructionError> {
        let credential = normalize_credential(credential);
        let key = PoolKey::derive(credential);
        let now = Instant::now();

        let mut entries = self.lock();
        if entries.closed {
            return Err(ConstructionError::PoolClosed);
        }

        if let Some(entry) = entries.map.get_mut(&key) {
            entry.touch(now);
            return Ok(Arc::clone(&entry.client));
        }

        // Built under the lock: concurrent lookups of a new key create one client
        let client = Arc::new(self.factory.create(&self.config.client_config(credential))?);
        entries
            .map
            .insert(key.clone(), PoolEntry::new(Arc::clone(&client), now));

        debug!(key = %key, pool_size = entries.map.len(), "Created pooled client");
        Ok(client)
    }

    fn remove(&self, credential: Option<&str>) -> bool {
        let key = PoolKey::derive(credential);
        let (removed, remaining) = {
            let mut entries = self.lock();
            (entries.map.remove(&key), entries.map.len())
        };

        match removed {
            Some(entry) => {
                release_entry(&key, entry, "removed");
                info!(key = %key, pool_size = remaining, "Removed pooled client");
                true
            }
            None => false,
        }
    }

    fn clear_all(&self) -> usize {
        let removed: Vec<(PoolKey, PoolEntry<F::Client>)> = {
            let mut entries = self.lock();
            let keys: Vec<PoolKey> = entries
                .map
                .keys()
                .filter(|key| !key.is_anonymous())
                .cloned()
                .collect();
            keys.into_iter()
                .filter_map(|key| entries.map.remove(&key).map(|entry| (key, entry)))
                .collect()
        };

        let count = removed.len();
        for (key, entry) in removed {
            release_entry(&key, entry, "cleared");
        }
        if count == 0 {
            debug!("No pooled clients to clear");
        } else {
            info!(cleared = count, "Cleared pooled clients");
        }
        count
    }

    /// Evict entries idle for at least the threshold (the boundary is inclusive)
    fn sweep_at(&self, now: Instant) -> usize {
        let threshold = self.config.idle_threshold;
        let (evicted, remaining) = {
            let mut entries = self.lock();
            debug!(pool_size = entries.map.len(), "Client pool sweep started");

            let idle: Vec<PoolKey> = entries
                .map
                .iter()
                .filter(|(key, entry)| !key.is_anonymous() && entry.idle_for(now) >= threshold)
                .map(|(key, _)| key.clone())
                .collect();
            let evicted: Vec<(PoolKey, PoolEntry<F::Client>)> = idle
                .into_iter()
                .filter_map(|key| entries.map.remove(&key).map(|entry| (key, entry)))
                .collect();
            (evicted, entries.map.len())
        };

        let count = evicted.len();
        for (key, entry) in evicted {
            release_entry(&key, entry, "idle");
            info!(key = %key, pool_size = remaining, "Evicted idle client");
        }
        count
    }

    /// Mark the pool closed and take every entry; `None` if already closed
    fn close(&self) -> Option<Vec<(PoolKey, PoolEntry<F::Client>)>> {
        let mut entries = self.lock();
        if entries.closed {
            return None;
        }
        entries.closed = true;
        Some(entries.map.drain().collect())
    }
}

/// Release a client's resources, logging instead of propagating failures
fn release_entry<C: LogicalClient>(key: &PoolKey, entry: PoolEntry<C>, reason: &'static str) {
    match panic::catch_unwind(AssertUnwindSafe(|| entry.client.release())) {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            warn!(key = %key, reason, error = %err, "Failed to release pooled client");
        }
        Err(_) => {
            warn!(key = %key, reason, "Pooled client panicked while releasing resources");
        }
    }
}

async fn run_sweeper<F: ClientFactory>(
    state: Weak<PoolState<F>>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        // The pool handle was dropped
        let Some(state) = state.upgrade() else {
            break;
        };
        state.sweep_at(Instant::now());
    }

    debug!("Client pool sweeper stopped");
}

// ============================================================================
// Client Pool
// ============================================================================

/// A keyed pool of logical clients with idle eviction
///
/// The anonymous client is created eagerly and is never swept or cleared.
/// The pool must be built inside a Tokio runtime, which drives the sweeper.
/// Share it by wrapping it in an `Arc`.
pub struct ClientPool<F: ClientFactory> {
    state: Arc<PoolState<F>>,
    sweeper: CancellationToken,
}

impl<F: ClientFactory> ClientPool<F> {
    /// Create a new pool and start its background sweep
    pub fn new(config: PoolConfig, factory: F) -> Result<Self, ConstructionError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| ConstructionError::NoRuntime)?;

        let anonymous = factory.create(&config.client_config(None))?;
        let mut map = HashMap::new();
        map.insert(
            PoolKey::anonymous(),
            PoolEntry::new(Arc::new(anonymous), Instant::now()),
        );

        let state = Arc::new(PoolState {
            config,
            factory,
            entries: Mutex::new(Entries { map, closed: false }),
        });

        let sweeper = CancellationToken::new();
        runtime.spawn(run_sweeper(
            Arc::downgrade(&state),
            state.config.sweep_interval,
            sweeper.clone(),
        ));

        info!(
            endpoint = %state.config.endpoint,
            idle_threshold_ms = state.config.idle_threshold.as_millis() as u64,
            sweep_interval_ms = state.config.sweep_interval.as_millis() as u64,
            cache_policy = %state.config.default_cache_policy,
            credential_mode = %state.config.credential_mode,
            "Client pool initialized"
        );

        Ok(Self { state, sweeper })
    }

    /// Get the client for a credential, creating it on first use
    ///
    /// Refreshes the client's last-used time. Construction failures are
    /// returned as-is and leave nothing behind in the pool.
    pub fn get(&self, credential: Option<&str>) -> Result<Arc<F::Client>, ConstructionError> {
        self.state.get(credential)
    }

    /// Release and drop the client for a credential, if there is one
    ///
    /// Removing the anonymous client is allowed; the next anonymous lookup
    /// builds a new one.
    pub fn remove(&self, credential: Option<&str>) -> bool {
        self.state.remove(credential)
    }

    /// Release and drop every client except the anonymous one
    pub fn clear_all(&self) -> usize {
        self.state.clear_all()
    }

    /// Evict idle clients now, returning how many were dropped
    ///
    /// The background task runs this on every tick.
    pub fn sweep(&self) -> usize {
        self.state.sweep_at(Instant::now())
    }

    /// Stop the sweeper and release every client, including the anonymous one
    ///
    /// Later lookups fail with [`ConstructionError::PoolClosed`]. Calling this
    /// more than once is harmless.
    pub fn shutdown(&self) {
        self.sweeper.cancel();

        let Some(drained) = self.state.close() else {
            return;
        };
        let count = drained.len();
        for (key, entry) in drained {
            release_entry(&key, entry, "shutdown");
        }
        info!(released = count, "Client pool shut down");
    }

    pub fn is_shut_down(&self) -> bool {
        self.state.lock().closed
    }

    /// Number of pooled clients, anonymous included
    pub fn len(&self) -> usize {
        self.state.lock().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check for a pooled client without touching it
    pub fn contains(&self, credential: Option<&str>) -> bool {
        self.state
            .lock()
            .map
            .contains_key(&PoolKey::derive(credential))
    }

    pub fn config(&self) -> &PoolConfig {
        &self.state.config
    }

    /// Get pool statistics
    pub fn stats(&self) -> PoolStats {
        let now = Instant::now();
        let entries = self.state.lock();
        let mut clients: Vec<ClientSummary> = entries
            .map
            .iter()
            .map(|(key, entry)| ClientSummary {
                key: key.redacted(),
                created_at: entry.created_at,
                idle_for: entry.idle_for(now),
            })
            .collect();
        clients.sort_by(|a, b| a.key.cmp(&b.key));

        PoolStats {
            total: entries.map.len(),
            anonymous_present: entries.map.contains_key(&PoolKey::anonymous()),
            idle_threshold: self.state.config.idle_threshold,
            sweep_interval: self.state.config.sweep_interval,
            shut_down: entries.closed,
            clients,
        }
    }
}

/// Dropping the pool shuts it down, releasing every remaining client
impl<F: ClientFactory> Drop for ClientPool<F> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ============================================================================
// Pool Statistics
// ============================================================================

/// Snapshot of one pooled client
#[derive(Debug, Clone)]
pub struct ClientSummary {
    /// Redacted pool key
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub idle_for: Duration,
}

/// Statistics about a client pool
#[derive(Debug, Clone)]
pub struct PoolStats {
    /// Number of pooled clients, anonymous included
    pub total: usize,
    pub anonymous_present: bool,
    pub idle_threshold: Duration,
    pub sweep_interval: Duration,
    pub shut_down: bool,
    pub clients: Vec<ClientSummary>,
}

impl PoolStats {
    /// Number of credential-bound clients
    pub fn authenticated(&self) -> usize {
        self.total - usize::from(self.anonymous_present)
    }
}

// ============================================================================
// Tests
// ============================================================================
