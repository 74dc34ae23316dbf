//! String utilities
//!
//! Helpers for safe string manipulation and for keeping secrets out of logs.

/// Safely truncate a string at a character boundary
///
/// Returns at most `max_chars` characters, never splitting a UTF-8 sequence.
///
/// # Example
/// ```
/// use orbitus::utils::truncate_str;
///
/// let text = "Hello, 世界!";
/// assert_eq!(truncate_str(text, 8), "Hello, 世");
/// assert_eq!(truncate_str(text, 100), "Hello, 世界!");
/// ```
pub fn truncate_str(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Safely truncate a string and append a suffix if truncated
///
/// # Example
/// ```
/// use orbitus::utils::truncate_with_suffix;
///
/// assert_eq!(truncate_with_suffix("Hello, World!", 5, "..."), "Hello...");
/// assert_eq!(truncate_with_suffix("Hi", 5, "..."), "Hi");
/// ```
pub fn truncate_with_suffix(s: &str, max_chars: usize, suffix: &str) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        format!("{}{}", truncate_str(s, max_chars), suffix)
    }
}

/// Number of leading characters a redacted secret keeps visible
pub const REDACT_VISIBLE_CHARS: usize = 4;

/// Secrets this short are masked completely
const REDACT_MIN_LEN: usize = 2 * REDACT_VISIBLE_CHARS;

/// Mask a secret (bearer token, API key) for log output
///
/// Short secrets are fully masked; longer ones keep a short prefix so two
/// different credentials can still be told apart in the logs.
///
/// # Example
/// ```
/// use orbitus::utils::redact_secret;
///
/// assert_eq!(redact_secret("abc"), "****");
/// assert_eq!(redact_secret("eyJhbGciOiJIUzI1NiJ9"), "eyJh…");
/// ```
pub fn redact_secret(secret: &str) -> String {
    if secret.chars().count() <= REDACT_MIN_LEN {
        "****".to_string()
    } else {
        truncate_with_suffix(secret, REDACT_VISIBLE_CHARS, "…")
    }
}
