use crate::value_objects::{Qualifier, TypeKey};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared dependency of a component
///
/// Injection points are checked at validation time: a required point that
/// resolves to nothing, or any point that resolves to several components,
/// fails the deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectionPoint {
    /// Requested type
    #[serde(rename = "type")]
    pub required_type: TypeKey,
    /// Requested qualifiers (empty means `@Default`)
    #[serde(default)]
    pub qualifiers: Vec<Qualifier>,
    /// Optional points may stay unsatisfied
    #[serde(default)]
    pub optional: bool,
    /// Field or parameter name, for diagnostics
    #[serde(default)]
    pub label: Option<String>,
}

impl InjectionPoint {
    /// Injection point for a type key
    pub fn new(required_type: TypeKey) -> Self {
        Self {
            required_type,
            qualifiers: Vec::new(),
            optional: false,
            label: None,
        }
    }

    /// Injection point for a Rust type
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(TypeKey::of::<T>())
    }

    /// Add a qualifier
    pub fn qualified(mut self, qualifier: Qualifier) -> Self {
        self.qualifiers.push(qualifier);
        self
    }

    /// Mark as optional
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Attach a diagnostic label
    pub fn labeled<S: Into<String>>(mut self, label: S) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl fmt::Display for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "{label}: ")?;
        }
        write!(f, "{}", self.required_type)?;
        for qualifier in &self.qualifiers {
            write!(f, " {qualifier}")?;
        }
        Ok(())
    }
}
