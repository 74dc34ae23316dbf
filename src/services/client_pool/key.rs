//! Pool keys
//!
//! Maps an optional credential to the key its client is stored under.

use std::fmt;

use crate::utils::redact_secret;

/// Key of the shared anonymous client
pub const ANONYMOUS_KEY: &str = "anon";

/// Prefix of every credential-derived key
const TOKEN_PREFIX: &str = "t:";

/// Treat an empty credential the same as no credential
pub fn normalize_credential(credential: Option<&str>) -> Option<&str> {
    credential.filter(|token| !token.is_empty())
}

/// Identifier of one pool entry
///
/// `anon` for anonymous access, `t:<credential>` otherwise. Because every
/// credential key carries the `t:` prefix, no credential can collide with
/// the anonymous key. `Debug` and `Display` redact the credential.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PoolKey(String);

impl PoolKey {
    /// Derive the key for an optional credential
    pub fn derive(credential: Option<&str>) -> Self {
        match normalize_credential(credential) {
            Some(token) => Self(format!("{}{}", TOKEN_PREFIX, token)),
            None => Self::anonymous(),
        }
    }

    pub fn anonymous() -> Self {
        Self(ANONYMOUS_KEY.to_string())
    }

    pub fn is_anonymous(&self) -> bool {
        self.0 == ANONYMOUS_KEY
    }

    /// The raw key, including the credential
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Log-safe form of the key
    pub fn redacted(&self) -> String {
        match self.0.strip_prefix(TOKEN_PREFIX) {
            Some(token) => format!("{}{}", TOKEN_PREFIX, redact_secret(token)),
            None => self.0.clone(),
        }
    }
}

impl fmt::Display for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted())
    }
}

impl fmt::Debug for PoolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PoolKey").field(&self.redacted()).finish()
    }
}

/// Derive the pool key for an optional credential
pub fn derive_key(credential: Option<&str>) -> PoolKey {
    PoolKey::derive(credential)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anonymous_key() {
        assert_eq!(derive_key(None).as_str(), "anon");
        assert!(derive_key(None).is_anonymous());
        assert_eq!(derive_key(None), PoolKey::anonymous());
    }

    #[test]
    fn test_empty_credential_is_anonymous() {
        assert!(derive_key(Some("")).is_anonymous());
    }

    #[test]
    fn test_token_key_format() {
        let key = derive_key(Some("abc123"));
        assert_eq!(key.as_str(), "t:abc123");
        assert!(!key.is_anonymous());
    }

    #[test]
    fn test_distinct_credentials_never_collide() {
        let credentials = ["a", "b", "anon", "t:a", "A", " a"];
        let keys: std::collections::HashSet<PoolKey> =
            credentials.iter().map(|c| derive_key(Some(c))).collect();
        assert_eq!(keys.len(), credentials.len());

        // A credential literally named "anon" is not the anonymous client
        assert!(!derive_key(Some("anon")).is_anonymous());
    }

    #[test]
    fn test_derivation_is_stable() {
        assert_eq!(derive_key(Some("tok")), derive_key(Some("tok")));
    }

    #[test]
    fn test_display_and_debug_redact_credential() {
        let key = derive_key(Some("very-secret-bearer-token"));
        assert_eq!(key.to_string(), "t:very…");
        assert!(!format!("{:?}", key).contains("secret"));
        assert_eq!(PoolKey::anonymous().to_string(), "anon");
    }
}
