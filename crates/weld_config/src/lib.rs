//! Parsing and validation of `weld.toml` build configuration files.
//!
//! This crate reads the build configuration file and produces a
//! strongly-typed [`BuildConfig`], with environment-variable overrides for
//! settings that are commonly tuned per machine (the link-cache byte budget
//! in long-running build daemons).

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{apply_env_overrides, load_config, load_config_from_str};
pub use types::{BuildConfig, CacheConfig};
