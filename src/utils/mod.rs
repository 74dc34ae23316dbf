//! Utility modules

pub mod string;

pub use string::{redact_secret, truncate_str, truncate_with_suffix};
