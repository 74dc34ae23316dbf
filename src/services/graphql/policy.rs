//! Cache and credential-forwarding policies
//!
//! Both enums are accepted from configuration files, environment variables
//! and CLI flags using their kebab-case / lowercase names.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Cache Policy
// ============================================================================

/// How a client consults its response cache for a query
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize, ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum CachePolicy {
    /// Always hit the network, never store the result
    NoCache,
    /// Serve from cache when possible, otherwise fetch and store (default)
    #[default]
    CacheFirst,
    /// Serve from cache only; a miss is an error
    CacheOnly,
    /// Always hit the network, store the result
    NetworkOnly,
    /// Same lookup rules as cache-first
    Standby,
    /// One-shot requests fetch from the network and refresh the cache
    CacheAndNetwork,
}

impl CachePolicy {
    /// Whether a cached response may satisfy the request
    pub fn reads_cache(self) -> bool {
        matches!(self, Self::CacheFirst | Self::CacheOnly | Self::Standby)
    }

    /// Whether a fresh network response is stored
    pub fn writes_cache(self) -> bool {
        !matches!(self, Self::NoCache | Self::CacheOnly)
    }

    /// Whether the network may be used at all
    pub fn allows_network(self) -> bool {
        self != Self::CacheOnly
    }
}

impl fmt::Display for CachePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NoCache => "no-cache",
            Self::CacheFirst => "cache-first",
            Self::CacheOnly => "cache-only",
            Self::NetworkOnly => "network-only",
            Self::Standby => "standby",
            Self::CacheAndNetwork => "cache-and-network",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for CachePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "no-cache" => Ok(Self::NoCache),
            "cache-first" => Ok(Self::CacheFirst),
            "cache-only" => Ok(Self::CacheOnly),
            "network-only" => Ok(Self::NetworkOnly),
            "standby" => Ok(Self::Standby),
            "cache-and-network" => Ok(Self::CacheAndNetwork),
            _ => anyhow::bail!(
                "Invalid cache policy: {}. Expected one of: no-cache, cache-first, cache-only, network-only, standby, cache-and-network",
                s
            ),
        }
    }
}

// ============================================================================
// Credential Forwarding
// ============================================================================

/// Whether the client's bound credential is sent with each request
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum CredentialMode {
    /// Never send the credential
    Omit,
    /// Send the credential as an `Authorization: Bearer` header (default)
    #[default]
    Include,
}

impl fmt::Display for CredentialMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Omit => f.write_str("omit"),
            Self::Include => f.write_str("include"),
        }
    }
}

impl std::str::FromStr for CredentialMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "omit" => Ok(Self::Omit),
            "include" => Ok(Self::Include),
            _ => anyhow::bail!("Invalid credential mode: {}. Expected: omit or include", s),
        }
    }
}
