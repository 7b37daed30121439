//! Configuration loader
//!
//! Loads configuration from defaults, a TOML file and environment variables,
//! using Figment.

use crate::config::{CustomScopeConfig, KilnConfig};
use crate::constants::{
    CONFIG_ENV_PREFIX, CONFIG_ENV_SEPARATOR, DEFAULT_CONFIG_DIR, DEFAULT_CONFIG_FILENAME,
};
use crate::error_ext::ErrorContext;
use crate::logging::{log_config_loaded, parse_log_level};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use kiln_domain::ScopeId;
use kiln_domain::error::{Error, Result};
use std::collections::HashSet;
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader service
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Configuration file path
    config_path: Option<PathBuf>,

    /// Environment prefix
    env_prefix: String,
}

impl ConfigLoader {
    /// Create a new configuration loader with default settings
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: CONFIG_ENV_PREFIX.to_string(),
        }
    }

    /// Set the configuration file path
    pub fn with_config_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the environment variable prefix
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Load configuration from all sources
    ///
    /// Later sources override earlier ones:
    /// 1. `KilnConfig::default()`
    /// 2. TOML configuration file (if it exists)
    /// 3. Environment variables, nested keys split on `__`
    ///    (e.g. `KILN_EVENTS__ASYNC_WORKERS=8`)
    pub fn load(&self) -> Result<KilnConfig> {
        let mut figment = Figment::new().merge(Serialized::defaults(KilnConfig::default()));

        if let Some(config_path) = &self.config_path {
            if config_path.exists() {
                figment = figment.merge(Toml::file(config_path));
                log_config_loaded(config_path, true);
            } else {
                log_config_loaded(config_path, false);
            }
        } else if let Some(default_path) = Self::find_default_config_path() {
            figment = figment.merge(Toml::file(&default_path));
            log_config_loaded(&default_path, true);
        }

        figment = figment
            .merge(Env::prefixed(&format!("{}_", self.env_prefix)).split(CONFIG_ENV_SEPARATOR));

        let config: KilnConfig = figment
            .extract()
            .config_context("Failed to extract configuration")?;

        validate_config(&config)?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, config: &KilnConfig, path: P) -> Result<()> {
        let toml_string =
            toml::to_string_pretty(config).config_context("Failed to serialize config to TOML")?;

        std::fs::write(path.as_ref(), toml_string).io_context("Failed to write config file")?;

        Ok(())
    }

    /// Get the current configuration file path
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// First existing default configuration file
    fn find_default_config_path() -> Option<PathBuf> {
        let current_dir = env::current_dir().ok()?;

        let candidates = vec![
            Some(current_dir.join(DEFAULT_CONFIG_FILENAME)),
            Some(
                current_dir
                    .join(format!(".{DEFAULT_CONFIG_DIR}"))
                    .join(DEFAULT_CONFIG_FILENAME),
            ),
            dirs::config_dir().map(|d| d.join(DEFAULT_CONFIG_DIR).join(DEFAULT_CONFIG_FILENAME)),
        ];

        candidates.into_iter().flatten().find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate a configuration
///
/// Called by [`ConfigLoader::load`] and again by the bootstrap, so configs
/// built in code get the same checks.
pub fn validate_config(config: &KilnConfig) -> Result<()> {
    parse_log_level(&config.logging.level)?;
    validate_events_config(config)?;
    validate_contexts_config(config)?;
    Ok(())
}

fn validate_events_config(config: &KilnConfig) -> Result<()> {
    if config.events.async_workers == 0 {
        return Err(Error::configuration(
            "events.async_workers must be at least 1",
        ));
    }
    Ok(())
}

fn validate_contexts_config(config: &KilnConfig) -> Result<()> {
    if config.contexts.conversation_timeout_secs == 0 {
        return Err(Error::configuration(
            "contexts.conversation_timeout_secs cannot be 0",
        ));
    }
    let mut seen = HashSet::new();
    for scope in &config.contexts.custom_scopes {
        validate_custom_scope(scope)?;
        if !seen.insert(scope.name.as_str()) {
            return Err(Error::configuration(format!(
                "Custom scope '{}' is declared twice",
                scope.name
            )));
        }
    }
    Ok(())
}

fn validate_custom_scope(scope: &CustomScopeConfig) -> Result<()> {
    if scope.name.trim().is_empty() {
        return Err(Error::configuration("Custom scope name cannot be empty"));
    }
    let parsed: ScopeId = scope
        .name
        .parse()
        .unwrap_or_else(|never: std::convert::Infallible| match never {});
    if parsed.is_builtin() {
        return Err(Error::configuration(format!(
            "Custom scope '{}' shadows a built-in scope",
            scope.name
        )));
    }
    Ok(())
}

/// Configuration builder for programmatic configuration
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: KilnConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log level
    pub fn with_log_level<S: Into<String>>(mut self, level: S) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// Enable an alternative by component id
    pub fn enable_alternative<S: Into<String>>(mut self, id: S) -> Self {
        self.config.deployment.enabled_alternatives.push(id.into());
        self
    }

    /// Enable an interceptor by id, after those already enabled
    pub fn enable_interceptor<S: Into<String>>(mut self, id: S) -> Self {
        self.config.deployment.enabled_interceptors.push(id.into());
        self
    }

    /// Enable a decorator by id, inside those already enabled
    pub fn enable_decorator<S: Into<String>>(mut self, id: S) -> Self {
        self.config.deployment.enabled_decorators.push(id.into());
        self
    }

    /// Report ambiguous names as warnings instead of deployment errors
    pub fn lenient_names(mut self) -> Self {
        self.config.deployment.strict_validation = false;
        self
    }

    /// Set the number of asynchronous observer threads
    pub fn with_async_workers(mut self, workers: usize) -> Self {
        self.config.events.async_workers = workers;
        self
    }

    /// Declare a custom scope
    pub fn with_custom_scope(mut self, scope: CustomScopeConfig) -> Self {
        self.config.contexts.custom_scopes.push(scope);
        self
    }

    /// Build the configuration
    pub fn build(self) -> KilnConfig {
        self.config
    }
}
