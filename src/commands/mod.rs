//! CLI subcommands

pub mod init;
pub mod query;

pub use query::QueryArgs;
