use crate::value_objects::{ComponentId, InterceptorBinding, Qualifier, TypeKey};
use serde::{Deserialize, Serialize};

/// Around-invoke interceptor metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterceptorDescriptor {
    /// Interceptor identity
    pub id: ComponentId,
    /// Bindings a component or method must carry for this interceptor to apply
    pub bindings: Vec<InterceptorBinding>,
    /// Ordering key; a priority also enables the interceptor
    pub priority: Option<i32>,
    /// Position in the discovery feed
    pub discovery_index: usize,
}

impl InterceptorDescriptor {
    /// Whether this interceptor binds to the given set of bindings
    pub fn binds_to(&self, bindings: &[&InterceptorBinding]) -> bool {
        !self.bindings.is_empty() && self.bindings.iter().all(|b| bindings.contains(&b))
    }
}

/// Decorator metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoratorDescriptor {
    /// Decorator identity
    pub id: ComponentId,
    /// Types the decorator implements on behalf of its delegate
    pub decorated_types: Vec<TypeKey>,
    /// Qualifiers of the delegate injection point
    pub delegate_qualifiers: Vec<Qualifier>,
    /// Ordering key; a priority also enables the decorator
    pub priority: Option<i32>,
    /// Position in the discovery feed
    pub discovery_index: usize,
}
