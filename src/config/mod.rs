//! Configuration module

pub mod settings;

pub use settings::{LoggingConfig, RegistryConfig, ServerConfig, Settings};
