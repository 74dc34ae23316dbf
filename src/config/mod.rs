//! Configuration management module
//!
//! This module handles loading and validating application configuration
//! from the config file, environment variables and .env files.

pub mod settings;

pub use settings::{Settings, CONFIG_TEMPLATE, DEFAULT_CONFIG_FILE, ENV_PREFIX};
