use crate::bean::Bean;
use crate::resolution::Registry;
use dashmap::DashMap;
use kiln_domain::error::{Error, Result};
use kiln_domain::{Qualifier, TypeKey};
use std::sync::Arc;

/// Outcome of a lookup
///
/// Unsatisfied and ambiguous stay distinct: the first is legal for optional
/// lookups, the second never is.
#[derive(Debug, Clone)]
pub enum Resolution {
    /// Nothing matches
    Unsatisfied,
    /// Exactly one component matches
    Resolved(Arc<Bean>),
    /// Several components remain after specialization and alternative filtering
    Ambiguous(Vec<Arc<Bean>>),
}

impl Resolution {
    /// Whether nothing matched
    pub fn is_unsatisfied(&self) -> bool {
        matches!(self, Self::Unsatisfied)
    }

    /// Whether several components matched
    pub fn is_ambiguous(&self) -> bool {
        matches!(self, Self::Ambiguous(_))
    }

    /// Whether exactly one component matched
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Every remaining candidate
    pub fn beans(&self) -> Vec<Arc<Bean>> {
        match self {
            Self::Unsatisfied => Vec::new(),
            Self::Resolved(bean) => vec![Arc::clone(bean)],
            Self::Ambiguous(beans) => beans.clone(),
        }
    }

    /// The single candidate, or an unsatisfied/ambiguous error describing the request
    pub fn into_single<F>(self, describe: F) -> Result<Arc<Bean>>
    where
        F: FnOnce() -> String,
    {
        match self {
            Self::Resolved(bean) => Ok(bean),
            Self::Unsatisfied => Err(Error::unsatisfied(describe())),
            Self::Ambiguous(beans) => Err(Error::ambiguous(
                describe(),
                beans.iter().map(|bean| bean.id().clone()),
            )),
        }
    }
}

/// Human-readable form of a lookup: the type followed by its qualifiers
pub fn describe_request(ty: &TypeKey, qualifiers: &[Qualifier]) -> String {
    let mut text = ty.to_string();
    for qualifier in qualifiers {
        text.push(' ');
        text.push_str(&qualifier.to_string());
    }
    text
}

type RequestKey = (TypeKey, Vec<Qualifier>);

/// Answers typesafe and name-based lookups against a [`Registry`]
///
/// The registry never changes after bootstrap, so every answer is cached.
pub struct Resolver {
    registry: Arc<Registry>,
    by_request: DashMap<RequestKey, Resolution>,
    by_name: DashMap<String, Resolution>,
}

impl Resolver {
    /// Resolver over a built registry
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            by_request: DashMap::new(),
            by_name: DashMap::new(),
        }
    }

    /// The registry this resolver reads
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Components of type `ty` carrying every requested qualifier
    ///
    /// An empty request means `@Default`. Specialized components are removed
    /// when their specializer also matches; if alternatives remain among
    /// several candidates only the highest-priority alternatives are kept.
    pub fn resolve(&self, ty: &TypeKey, qualifiers: &[Qualifier]) -> Resolution {
        let key = (ty.clone(), Qualifier::normalize_request(qualifiers));
        if let Some(cached) = self.by_request.get(&key) {
            return cached.clone();
        }

        let candidates: Vec<Arc<Bean>> = self
            .registry
            .beans_of_type(ty)
            .iter()
            .filter(|bean| {
                bean.descriptor().is_enabled()
                    && Qualifier::satisfied_by(&key.1, &bean.descriptor().qualifiers)
            })
            .cloned()
            .collect();
        let resolution = self.disambiguate(candidates);
        self.by_request.insert(key, resolution.clone());
        resolution
    }

    /// Components registered under `name`, filtered like [`resolve`](Self::resolve)
    pub fn resolve_named(&self, name: &str) -> Resolution {
        if let Some(cached) = self.by_name.get(name) {
            return cached.clone();
        }
        let candidates: Vec<Arc<Bean>> = self
            .registry
            .beans_named(name)
            .iter()
            .filter(|bean| bean.descriptor().is_enabled())
            .cloned()
            .collect();
        let resolution = self.disambiguate(candidates);
        self.by_name.insert(name.to_string(), resolution.clone());
        resolution
    }

    fn disambiguate(&self, candidates: Vec<Arc<Bean>>) -> Resolution {
        let mut remaining: Vec<Arc<Bean>> = candidates
            .iter()
            .filter(|bean| {
                !candidates
                    .iter()
                    .any(|other| self.registry.is_specialized_by(bean.id(), other.id()))
            })
            .cloned()
            .collect();

        if remaining.len() > 1 && remaining.iter().any(|bean| bean.descriptor().alternative) {
            remaining.retain(|bean| bean.descriptor().alternative);
            let top = remaining
                .iter()
                .filter_map(|bean| bean.descriptor().priority)
                .max();
            if let Some(top) = top {
                remaining.retain(|bean| bean.descriptor().priority == Some(top));
            }
        }

        match remaining.len() {
            0 => Resolution::Unsatisfied,
            1 => remaining
                .pop()
                .map_or(Resolution::Unsatisfied, Resolution::Resolved),
            _ => Resolution::Ambiguous(remaining),
        }
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("registry", &self.registry)
            .field("cached", &(self.by_request.len() + self.by_name.len()))
            .finish()
    }
}
