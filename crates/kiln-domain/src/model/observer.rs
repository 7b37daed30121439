use crate::value_objects::{ComponentId, Qualifier, TypeKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dispatch mode of an observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObserverMode {
    /// Invoked on the firing thread, in order
    #[default]
    Sync,
    /// Submitted to the worker pool
    Async,
}

/// When an observer on a component is notified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reception {
    /// Create the owning instance if needed
    #[default]
    Always,
    /// Only notify when the owning instance already exists
    IfExists,
}

/// Observer method metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverDescriptor {
    /// Observer identity, e.g. `Garage::on_arrival`
    pub id: String,
    /// Observed event type
    pub observed_type: TypeKey,
    /// Qualifier filter; empty observes every event of the type
    pub qualifiers: Vec<Qualifier>,
    /// Lower values observe first
    pub priority: i32,
    /// Owning component, `None` for static observers
    pub owner: Option<ComponentId>,
    /// Dispatch mode
    pub mode: ObserverMode,
    /// Owner creation policy
    pub reception: Reception,
    /// Tolerant observers never abort synchronous dispatch
    pub tolerant: bool,
    /// Position in the discovery feed, breaks priority ties
    pub discovery_index: usize,
}

impl ObserverDescriptor {
    /// Ordering key: priority ascending, then discovery order
    pub fn ordering_key(&self) -> (i32, usize) {
        (self.priority, self.discovery_index)
    }

    /// Whether the observer runs on the worker pool
    pub fn is_async(&self) -> bool {
        self.mode == ObserverMode::Async
    }
}

impl fmt::Display for ObserverDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} observes {}", self.id, self.observed_type)?;
        for qualifier in &self.qualifiers {
            write!(f, " {qualifier}")?;
        }
        Ok(())
    }
}
