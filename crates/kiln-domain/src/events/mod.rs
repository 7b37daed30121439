//! Container lifecycle event payloads
//!
//! Fired through the ordinary event dispatcher so application observers can
//! react to the container becoming ready or shutting down.

use serde::{Deserialize, Serialize};

/// Fired once after bootstrap completed and every shared context is active
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerInitialized {
    /// Number of registered components
    pub components: usize,
    /// Number of registered observers
    pub observers: usize,
}

/// Fired at the start of shutdown, before any context is destroyed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContainerShutdown;
