//! Shared foundation for the ragline relay: configuration loading and
//! validation. Everything else lives in the `slack`, `relay`, and `server`
//! crates.

pub mod config;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions};
