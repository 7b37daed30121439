//! Error handling types
//!
//! Definition and deployment errors are fatal and aggregate every problem
//! found during bootstrap. The remaining variants are runtime errors local to
//! the call that triggered them.

use thiserror::Error;

/// Result type alias for operations that can fail
pub type Result<T> = std::result::Result<T, Error>;

type BoxedSource = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for the Kiln container
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed component metadata, detected at discovery
    #[error("Definition error: {}", .problems.join("; "))]
    Definition {
        /// Every problem found
        problems: Vec<String>,
    },

    /// Unresolvable or inconsistent deployment, detected at validation
    #[error("Deployment error: {}", .problems.join("; "))]
    Deployment {
        /// Every problem found
        problems: Vec<String>,
    },

    /// Lookup against a scope whose context is not active
    #[error("Context not active: {scope}")]
    ContextNotActive {
        /// Scope that was looked up
        scope: String,
    },

    /// A component's own construction or initialization failed
    #[error("Creation of {component} failed: {message}")]
    Creation {
        /// Component being created
        component: String,
        /// Description of the failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<BoxedSource>,
    },

    /// An observer failed while handling an event
    #[error("Observer {observer} failed: {message}")]
    ObserverInvocation {
        /// Observer identity
        observer: String,
        /// Description of the failure
        message: String,
        /// Optional source error
        #[source]
        source: Option<BoxedSource>,
    },

    /// No component matches a required lookup
    #[error("Unsatisfied dependency: {request}")]
    Unsatisfied {
        /// Requested type and qualifiers
        request: String,
    },

    /// More than one component matches a lookup
    #[error("Ambiguous dependency: {request} matches {}", .candidates.join(", "))]
    Ambiguous {
        /// Requested type and qualifiers
        request: String,
        /// Remaining candidates
        candidates: Vec<String>,
    },

    /// A component does not expose the requested type
    #[error("Type mismatch: {component} does not provide {expected}")]
    TypeMismatch {
        /// Requested type
        expected: String,
        /// Component involved
        component: String,
    },

    /// Operation not allowed in the current state
    #[error("Illegal state: {message}")]
    IllegalState {
        /// Description of the state problem
        message: String,
    },

    /// Configuration-related error
    #[error("Configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
        /// Optional source error
        #[source]
        source: Option<BoxedSource>,
    },

    /// I/O operation error
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O error
        message: String,
        /// Optional source error
        #[source]
        source: Option<BoxedSource>,
    },

    /// JSON parsing or serialization error
    #[error("JSON error: {source}")]
    Json {
        /// The underlying JSON error
        #[from]
        source: serde_json::Error,
    },

    /// Internal error
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error
        message: String,
        /// Optional source error
        #[source]
        source: Option<BoxedSource>,
    },
}

// Bootstrap error creation methods
impl Error {
    /// Create a definition error from a list of problems
    pub fn definition<I, S>(problems: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Definition {
            problems: problems.into_iter().map(Into::into).collect(),
        }
    }

    /// Create a deployment error from a list of problems
    pub fn deployment<I, S>(problems: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Deployment {
            problems: problems.into_iter().map(Into::into).collect(),
        }
    }

    /// Problems carried by a definition or deployment error
    pub fn problems(&self) -> &[String] {
        match self {
            Self::Definition { problems } | Self::Deployment { problems } => problems,
            _ => &[],
        }
    }
}

// Runtime error creation methods
impl Error {
    /// Create a context-not-active error
    pub fn context_not_active<S: ToString>(scope: S) -> Self {
        Self::ContextNotActive {
            scope: scope.to_string(),
        }
    }

    /// Create a creation error
    pub fn creation<C: ToString, S: Into<String>>(component: C, message: S) -> Self {
        Self::Creation {
            component: component.to_string(),
            message: message.into(),
            source: None,
        }
    }

    /// Create a creation error with source
    pub fn creation_with_source<C, S, E>(component: C, message: S, source: E) -> Self
    where
        C: ToString,
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Creation {
            component: component.to_string(),
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an observer invocation error
    pub fn observer_invocation<O: ToString, S: Into<String>>(observer: O, message: S) -> Self {
        Self::ObserverInvocation {
            observer: observer.to_string(),
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an error raised by an observer
    pub fn observer_failed<O: ToString>(observer: O, source: Error) -> Self {
        Self::ObserverInvocation {
            observer: observer.to_string(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an unsatisfied-dependency error
    pub fn unsatisfied<S: Into<String>>(request: S) -> Self {
        Self::Unsatisfied {
            request: request.into(),
        }
    }

    /// Create an ambiguous-dependency error
    pub fn ambiguous<S, I, C>(request: S, candidates: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = C>,
        C: ToString,
    {
        Self::Ambiguous {
            request: request.into(),
            candidates: candidates.into_iter().map(|c| c.to_string()).collect(),
        }
    }

    /// Create a type mismatch error
    pub fn type_mismatch<E: Into<String>, C: ToString>(expected: E, component: C) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            component: component.to_string(),
        }
    }

    /// Create an illegal state error
    pub fn illegal_state<S: Into<String>>(message: S) -> Self {
        Self::IllegalState {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }
}

// Configuration and I/O error creation methods
impl Error {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error with source
    pub fn configuration_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Configuration {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io {
            message: message.into(),
            source: None,
        }
    }
}

// Classification helpers
impl Error {
    /// Whether a lookup hit an inactive context
    pub fn is_context_not_active(&self) -> bool {
        matches!(self, Self::ContextNotActive { .. })
    }

    /// Whether a lookup matched nothing
    pub fn is_unsatisfied(&self) -> bool {
        matches!(self, Self::Unsatisfied { .. })
    }

    /// Whether a lookup matched several components
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous { .. })
    }

    /// Whether this error aborts bootstrap
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Definition { .. } | Self::Deployment { .. })
    }
}
