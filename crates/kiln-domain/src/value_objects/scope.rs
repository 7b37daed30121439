//! Scopes
//!
//! A scope is a lifecycle policy. Its [`ScopeDefinition`] tells the engine
//! whether references to it are proxied (normal scopes), whether one context
//! is shared by the whole process or each unit of work gets its own, and
//! whether its instances may be passivated.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Scope identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScopeId {
    /// Pseudo-scope bound to the declaring injection; never proxied, never stored
    Dependent,
    /// Pseudo-scope with one shared instance per process; not proxied
    Singleton,
    /// One instance per process, proxied
    Application,
    /// One instance per request boundary
    Request,
    /// One instance per session; passivating
    Session,
    /// One instance per conversation; passivating
    Conversation,
    /// Scope registered by configuration or an extension
    Custom(String),
}

impl ScopeId {
    /// Scope name as written in metadata
    pub fn as_str(&self) -> &str {
        match self {
            Self::Dependent => "dependent",
            Self::Singleton => "singleton",
            Self::Application => "application",
            Self::Request => "request",
            Self::Session => "session",
            Self::Conversation => "conversation",
            Self::Custom(name) => name,
        }
    }

    /// Whether this is one of the built-in scopes
    pub fn is_builtin(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "dependent" => Self::Dependent,
            "singleton" => Self::Singleton,
            "application" => Self::Application,
            "request" => Self::Request,
            "session" => Self::Session,
            "conversation" => Self::Conversation,
            _ => Self::Custom(s.to_string()),
        })
    }
}

impl Serialize for ScopeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ScopeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(ScopeId::from_str(&name).unwrap_or_else(|never| match never {}))
    }
}

/// Behavioural definition of a scope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDefinition {
    /// Scope identifier
    pub id: ScopeId,
    /// Normal scopes are reached through client proxies
    pub normal: bool,
    /// Shared scopes have one process-wide context; others get one per unit of work
    pub shared: bool,
    /// Instances of passivating scopes must be passivation capable
    pub passivating: bool,
}

impl ScopeDefinition {
    /// Definition of a custom scope
    pub fn custom<S: Into<String>>(name: S, normal: bool, shared: bool, passivating: bool) -> Self {
        Self {
            id: ScopeId::Custom(name.into()),
            normal,
            shared,
            passivating,
        }
    }

    /// Definition of a built-in scope, `None` for custom ids
    pub fn builtin(id: &ScopeId) -> Option<Self> {
        let (normal, shared, passivating) = match id {
            ScopeId::Dependent => (false, false, false),
            ScopeId::Singleton => (false, true, false),
            ScopeId::Application => (true, true, false),
            ScopeId::Request => (true, false, false),
            ScopeId::Session | ScopeId::Conversation => (true, false, true),
            ScopeId::Custom(_) => return None,
        };
        Some(Self {
            id: id.clone(),
            normal,
            shared,
            passivating,
        })
    }

    /// All built-in scope definitions
    pub fn builtins() -> Vec<Self> {
        [
            ScopeId::Dependent,
            ScopeId::Singleton,
            ScopeId::Application,
            ScopeId::Request,
            ScopeId::Session,
            ScopeId::Conversation,
        ]
        .iter()
        .filter_map(Self::builtin)
        .collect()
    }

    /// Whether this is the dependent pseudo-scope
    pub fn is_dependent(&self) -> bool {
        self.id == ScopeId::Dependent
    }

    /// Destruction rank at shutdown: thread-affine scopes go before shared ones
    pub fn shutdown_rank(&self) -> u8 {
        match (&self.id, self.shared) {
            (ScopeId::Request, _) => 0,
            (ScopeId::Conversation, _) => 1,
            (ScopeId::Session, _) => 2,
            (_, false) => 3,
            (ScopeId::Application, _) => 5,
            (ScopeId::Singleton, _) => 6,
            (_, true) => 4,
        }
    }
}
