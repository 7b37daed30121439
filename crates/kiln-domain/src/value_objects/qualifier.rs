//! Qualifiers and interceptor bindings
//!
//! Both are annotation-like values: a kind plus attribute members. Members
//! listed as non-binding are carried for diagnostics but ignored when two
//! values are compared, so `@Turbo(cylinders = 8, label = "x")` with `label`
//! non-binding equals `@Turbo(cylinders = 8, label = "y")`.

use crate::constants::{ANY_QUALIFIER, DEFAULT_QUALIFIER, NAMED_QUALIFIER, NAMED_VALUE_MEMBER};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Typed discriminator attached to a component, an injection point or an event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Qualifier {
    kind: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    members: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    nonbinding: BTreeSet<String>,
}

impl Qualifier {
    /// Qualifier without members
    pub fn new<S: Into<String>>(kind: S) -> Self {
        Self {
            kind: kind.into(),
            members: BTreeMap::new(),
            nonbinding: BTreeSet::new(),
        }
    }

    /// The implicit `@Default` marker
    pub fn default_marker() -> Self {
        Self::new(DEFAULT_QUALIFIER)
    }

    /// The `@Any` marker every component carries
    pub fn any() -> Self {
        Self::new(ANY_QUALIFIER)
    }

    /// `@Named(name)`
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self::new(NAMED_QUALIFIER).with_member(NAMED_VALUE_MEMBER, Value::String(name.into()))
    }

    /// Add a binding member
    pub fn with_member<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.members.insert(key.into(), value.into());
        self
    }

    /// Add a member ignored by comparisons
    pub fn with_nonbinding_member<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        let key = key.into();
        self.nonbinding.insert(key.clone());
        self.members.insert(key, value.into());
        self
    }

    /// Qualifier kind, e.g. `Turbo`
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Value of a member
    pub fn member(&self, key: &str) -> Option<&Value> {
        self.members.get(key)
    }

    /// Whether this is `@Default`
    pub fn is_default(&self) -> bool {
        self.kind == DEFAULT_QUALIFIER
    }

    /// Whether this is `@Any`
    pub fn is_any(&self) -> bool {
        self.kind == ANY_QUALIFIER
    }

    /// Whether this is `@Named`
    pub fn is_named(&self) -> bool {
        self.kind == NAMED_QUALIFIER
    }

    /// Name carried by an `@Named` qualifier
    pub fn name_value(&self) -> Option<&str> {
        if !self.is_named() {
            return None;
        }
        self.members.get(NAMED_VALUE_MEMBER).and_then(Value::as_str)
    }

    fn binding_members(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.members
            .iter()
            .filter(|(key, _)| !self.nonbinding.contains(*key))
    }

    /// Binding members with their values in canonical text, used for hashing and ordering
    fn binding_key(&self) -> impl Iterator<Item = (&String, String)> {
        self.binding_members().map(|(key, value)| (key, value.to_string()))
    }

    /// Normalize the qualifiers of a request (injection point, lookup, event)
    ///
    /// An empty request means `@Default`. Unlike a component, a request
    /// carrying only `@Named` gets no implicit `@Default`. Duplicates are
    /// removed and the result is sorted so equal requests produce equal keys.
    pub fn normalize_request(requested: &[Qualifier]) -> Vec<Qualifier> {
        if requested.is_empty() {
            return vec![Qualifier::default_marker()];
        }
        let mut normalized: Vec<Qualifier> = requested.to_vec();
        normalized.sort();
        normalized.dedup();
        normalized
    }

    /// Whether `available` satisfies every qualifier in `requested`
    ///
    /// `@Any` in the request always matches. Every other requested qualifier
    /// must be present in `available`, compared by kind and binding members.
    pub fn satisfied_by(requested: &[Qualifier], available: &[Qualifier]) -> bool {
        requested
            .iter()
            .all(|wanted| wanted.is_any() || available.contains(wanted))
    }
}

impl PartialEq for Qualifier {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.binding_members().eq(other.binding_members())
    }
}

impl Eq for Qualifier {}

impl Hash for Qualifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        for member in self.binding_key() {
            member.hash(state);
        }
    }
}

impl PartialOrd for Qualifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Qualifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then_with(|| self.binding_key().cmp(other.binding_key()))
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.kind)?;
        if self.members.is_empty() {
            return Ok(());
        }
        let members: Vec<String> = self
            .members
            .iter()
            .map(|(key, value)| format!("{key} = {value}"))
            .collect();
        write!(f, "({})", members.join(", "))
    }
}

/// Binds interceptors to the components and methods they wrap
///
/// Compared like a [`Qualifier`]: kind plus binding members.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InterceptorBinding(Qualifier);

impl InterceptorBinding {
    /// Binding without members
    pub fn new<S: Into<String>>(kind: S) -> Self {
        Self(Qualifier::new(kind))
    }

    /// Add a binding member
    pub fn with_member<K: Into<String>, V: Into<Value>>(self, key: K, value: V) -> Self {
        Self(self.0.with_member(key, value))
    }

    /// Add a member ignored by comparisons
    pub fn with_nonbinding_member<K: Into<String>, V: Into<Value>>(self, key: K, value: V) -> Self {
        Self(self.0.with_nonbinding_member(key, value))
    }

    /// Binding kind
    pub fn kind(&self) -> &str {
        self.0.kind()
    }
}

impl fmt::Display for InterceptorBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
