//! Shared configuration and error taxonomy for slashbot.

pub mod config;
pub mod errors;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use errors::{ApplicationError, InterfaceError};
