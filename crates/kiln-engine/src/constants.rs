//! Engine constants
//!
//! Contains constants that are part of the engine implementation.
//! Domain constants (qualifier names, priorities) live in `kiln_domain::constants`.

// ============================================================================
// CONFIGURATION CONSTANTS
// ============================================================================

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "kiln.toml";

/// Default configuration directory name
pub const DEFAULT_CONFIG_DIR: &str = "kiln";

/// Environment variable prefix for configuration
pub const CONFIG_ENV_PREFIX: &str = "KILN";

/// Separator between nested keys in environment variables (`KILN_EVENTS__ASYNC_WORKERS`)
pub const CONFIG_ENV_SEPARATOR: &str = "__";

// ============================================================================
// LOGGING CONSTANTS
// ============================================================================

/// Environment variable overriding the log filter
pub const LOG_ENV_VAR: &str = "KILN_LOG";

/// Default log level
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Stem of rolled log files when the configured path has none
pub const DEFAULT_LOG_FILE_STEM: &str = "kiln";

// ============================================================================
// EVENT CONSTANTS
// ============================================================================

/// Default number of threads delivering asynchronous observers
pub const DEFAULT_ASYNC_WORKERS: usize = 4;

/// Name of the threads delivering asynchronous observers
pub const ASYNC_WORKER_THREAD_NAME: &str = "kiln-observer";

// ============================================================================
// CONTEXT CONSTANTS
// ============================================================================

/// Default idle time after which a conversation may be swept (30 minutes)
pub const DEFAULT_CONVERSATION_TIMEOUT_SECS: u64 = 1800;
