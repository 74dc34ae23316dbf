//! Error types shared across the pool and its clients

mod types;

pub use types::{ConstructionError, ReleaseError};
