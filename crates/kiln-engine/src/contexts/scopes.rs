use kiln_domain::{ScopeDefinition, ScopeId};
use std::collections::BTreeMap;

/// Scope definitions known to a deployment
#[derive(Debug, Clone)]
pub struct ScopeRegistry {
    scopes: BTreeMap<ScopeId, ScopeDefinition>,
}

impl ScopeRegistry {
    /// Registry holding the built-in scopes
    pub fn new() -> Self {
        Self {
            scopes: ScopeDefinition::builtins()
                .into_iter()
                .map(|definition| (definition.id.clone(), definition))
                .collect(),
        }
    }

    /// Register a custom scope
    ///
    /// Returns a definition problem when the id is built in or already registered.
    pub fn register(&mut self, definition: ScopeDefinition) -> Result<(), String> {
        if definition.id.is_builtin() {
            return Err(format!("scope '{}' is built in", definition.id));
        }
        if self.scopes.contains_key(&definition.id) {
            return Err(format!("scope '{}' is registered twice", definition.id));
        }
        self.scopes.insert(definition.id.clone(), definition);
        Ok(())
    }

    /// Definition of a scope
    pub fn get(&self, id: &ScopeId) -> Option<&ScopeDefinition> {
        self.scopes.get(id)
    }

    /// Whether components of `id` are reached through client proxies
    pub fn is_normal(&self, id: &ScopeId) -> bool {
        self.get(id).is_some_and(|scope| scope.normal)
    }

    /// Whether `id` requires passivation-capable components
    pub fn is_passivating(&self, id: &ScopeId) -> bool {
        self.get(id).is_some_and(|scope| scope.passivating)
    }

    /// Every definition
    pub fn definitions(&self) -> impl Iterator<Item = &ScopeDefinition> {
        self.scopes.values()
    }

    /// Scopes with one process-wide context
    pub fn shared(&self) -> impl Iterator<Item = &ScopeDefinition> {
        self.definitions()
            .filter(|scope| scope.shared && !scope.is_dependent())
    }

    /// Scopes with one context per unit of work
    pub fn thread_affine(&self) -> impl Iterator<Item = &ScopeDefinition> {
        self.definitions()
            .filter(|scope| !scope.shared && !scope.is_dependent())
    }
}

impl Default for ScopeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
