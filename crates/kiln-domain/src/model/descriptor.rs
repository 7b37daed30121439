use crate::model::InjectionPoint;
use crate::value_objects::{ComponentId, InterceptorBinding, Qualifier, ScopeId, TypeKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Normalized description of a discovered component
///
/// Produced once by [`crate::DescriptorFactory`]. The type closure is never
/// empty and always contains [`TypeKey::object`]; the qualifier set always
/// contains `@Any` and contains `@Default` unless an explicit qualifier was
/// declared. Only `enabled` is written after discovery, once, when the
/// registry applies alternative enablement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentDescriptor {
    /// Stable identity
    pub id: ComponentId,
    /// Name of the implementing class
    pub class_name: String,
    /// Every type this component satisfies
    pub types: Vec<TypeKey>,
    /// Normalized qualifier set
    pub qualifiers: Vec<Qualifier>,
    /// Lifecycle scope
    pub scope: ScopeId,
    /// Name for name-based lookup
    pub name: Option<String>,
    /// Alternatives only participate in resolution when enabled
    pub alternative: bool,
    /// Ordering key; on an alternative it also enables it
    pub priority: Option<i32>,
    /// Alternative enablement, set once by the registry
    pub enabled: bool,
    /// Component this one overrides
    pub specializes: Option<ComponentId>,
    /// Declared dependencies
    pub injection_points: Vec<InjectionPoint>,
    /// Component-level interceptor bindings
    pub interceptor_bindings: Vec<InterceptorBinding>,
    /// Method-level interceptor bindings
    pub method_bindings: BTreeMap<String, Vec<InterceptorBinding>>,
    /// Whether instances may be passivated
    pub passivation_capable: bool,
    /// Position in the discovery feed
    pub discovery_index: usize,
}

impl ComponentDescriptor {
    /// Whether the type closure contains `ty`
    pub fn has_type(&self, ty: &TypeKey) -> bool {
        self.types.contains(ty)
    }

    /// Whether the component participates in resolution
    pub fn is_enabled(&self) -> bool {
        !self.alternative || self.enabled
    }

    /// Interceptor bindings that apply to `method`
    pub fn bindings_for(&self, method: &str) -> Vec<&InterceptorBinding> {
        let mut bindings: Vec<&InterceptorBinding> = self.interceptor_bindings.iter().collect();
        if let Some(method_bindings) = self.method_bindings.get(method) {
            bindings.extend(method_bindings.iter());
        }
        bindings
    }

    /// Explicit qualifiers, without the `@Any`/`@Default` markers
    pub fn explicit_qualifiers(&self) -> impl Iterator<Item = &Qualifier> {
        self.qualifiers
            .iter()
            .filter(|q| !q.is_any() && !q.is_default())
    }
}

impl fmt::Display for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}", self.id, self.scope)?;
        for qualifier in self.explicit_qualifiers() {
            write!(f, " {qualifier}")?;
        }
        if self.alternative {
            f.write_str(" alternative")?;
        }
        f.write_str("]")
    }
}
