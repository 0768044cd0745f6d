//! Configuration utilities.

pub mod toml_config;

pub use toml_config::{AppConfig, ConfigError};
