//! orbitus runtime library
//!
//! A keyed, idle-evicting pool of per-credential GraphQL clients, plus the
//! configuration, logging and commands of the `orbitus` CLI.

// Public modules
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use error::{ConstructionError, ReleaseError};
pub use services::client_pool::{
    ClientPool, DispatchError, DispatchFacade, GraphqlClientPool, GraphqlDispatch, PoolConfig,
};
