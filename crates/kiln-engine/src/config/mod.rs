//! Configuration
//!
//! [`KilnConfig`] is loaded once, before bootstrap, by [`ConfigLoader`]:
//! defaults, then a TOML file, then `KILN_`-prefixed environment variables.

mod loader;
mod types;

pub use loader::{ConfigBuilder, ConfigLoader, validate_config};
pub use types::{
    ContextsConfig, CustomScopeConfig, DeploymentConfig, EventsConfig, KilnConfig, LoggingConfig,
};
