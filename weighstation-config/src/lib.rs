//! Shared configuration library for the weighstation kiosk.
//!
//! Configuration is layered: built-in defaults, an optional TOML file, a
//! `.env` file, the process environment, and finally whatever overrides the
//! binary applies from its command line. [`ConfigLoader`] composes the layers
//! and returns the effective [`Config`] alongside any guard-rail
//! [`ConfigWarnings`] worth surfacing to the operator.

pub mod constants;
pub mod loader;
pub mod models;
pub mod util;
pub mod validation;

pub use loader::{
    ConfigLoad, ConfigLoader, ConfigLoaderOptions, error::ConfigLoadError,
};
pub use models::{
    CardReaderConfig, Config, ConfigMetadata, InjectionPolicy, ScaleConfig,
    ServerConfig, TicketConfig,
};
pub use validation::{ConfigWarning, ConfigWarnings};
