use crate::constants::{
    DEFAULT_ASYNC_WORKERS, DEFAULT_CONVERSATION_TIMEOUT_SECS, DEFAULT_LOG_LEVEL,
};
use kiln_domain::ScopeDefinition;
use kiln_domain::constants::DEFAULT_OBSERVER_PRIORITY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KilnConfig {
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Deployment policy: enabled alternatives, interceptors, decorators
    pub deployment: DeploymentConfig,
    /// Event dispatch configuration
    pub events: EventsConfig,
    /// Context configuration
    pub contexts: ContextsConfig,
}

// ============================================================================
// Logging Configuration
// ============================================================================

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Enable JSON output format
    pub json_format: bool,
    /// Log to file in addition to stdout
    pub file_output: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            json_format: false,
            file_output: None,
        }
    }
}

// ============================================================================
// Deployment Configuration
// ============================================================================

/// Deployment unit policy
///
/// Alternative precedence across deployment units is decided here, not by
/// the engine: an alternative is enabled when its id is listed or when it
/// declares a priority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeploymentConfig {
    /// Component ids of alternatives enabled for this deployment
    pub enabled_alternatives: Vec<String>,
    /// Interceptor ids enabled without a priority, in invocation order
    pub enabled_interceptors: Vec<String>,
    /// Decorator ids enabled without a priority, outermost first
    pub enabled_decorators: Vec<String>,
    /// Treat ambiguous component names as deployment errors
    pub strict_validation: bool,
}

impl Default for DeploymentConfig {
    fn default() -> Self {
        Self {
            enabled_alternatives: Vec::new(),
            enabled_interceptors: Vec::new(),
            enabled_decorators: Vec::new(),
            strict_validation: true,
        }
    }
}

// ============================================================================
// Events Configuration
// ============================================================================

/// Event dispatch configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Threads delivering asynchronous observers
    pub async_workers: usize,
    /// Priority of observers that declare none
    pub default_priority: i32,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            async_workers: DEFAULT_ASYNC_WORKERS,
            default_priority: DEFAULT_OBSERVER_PRIORITY,
        }
    }
}

// ============================================================================
// Contexts Configuration
// ============================================================================

/// Context configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextsConfig {
    /// Idle time after which a conversation is swept
    pub conversation_timeout_secs: u64,
    /// Additional scopes
    pub custom_scopes: Vec<CustomScopeConfig>,
}

impl ContextsConfig {
    /// Conversation timeout as a duration
    pub fn conversation_timeout(&self) -> Duration {
        Duration::from_secs(self.conversation_timeout_secs)
    }
}

impl Default for ContextsConfig {
    fn default() -> Self {
        Self {
            conversation_timeout_secs: DEFAULT_CONVERSATION_TIMEOUT_SECS,
            custom_scopes: Vec::new(),
        }
    }
}

/// Custom scope declared in configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomScopeConfig {
    /// Scope name as used in component metadata
    pub name: String,
    /// Reached through client proxies
    #[serde(default = "default_true")]
    pub normal: bool,
    /// One context for the whole process
    #[serde(default)]
    pub shared: bool,
    /// Instances must be passivation capable
    #[serde(default)]
    pub passivating: bool,
}

impl CustomScopeConfig {
    /// Scope definition for the engine
    pub fn definition(&self) -> ScopeDefinition {
        ScopeDefinition::custom(self.name.clone(), self.normal, self.shared, self.passivating)
    }
}

fn default_true() -> bool {
    true
}
