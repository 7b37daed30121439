use crate::contexts::ContextualStore;
use kiln_domain::error::{Error, Result};
use kiln_domain::{ScopeDefinition, ScopeId};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Activation state of one scope, plus the store backing it while active
///
/// Inactive → Active → Inactive. Activation attaches a backing store;
/// deactivation detaches it and leaves its instances alive (the store may
/// be attached again later, e.g. the next request of the same session);
/// invalidation destroys every instance, then detaches.
pub struct Context {
    scope: ScopeDefinition,
    store: RwLock<Option<Arc<ContextualStore>>>,
}

impl Context {
    /// Inactive context for a scope
    pub fn new(scope: ScopeDefinition) -> Self {
        Self {
            scope,
            store: RwLock::new(None),
        }
    }

    /// Context already active with a fresh store
    pub fn active(scope: ScopeDefinition) -> Self {
        let context = Self::new(scope);
        context.activate(ContextualStore::new_shared());
        context
    }

    /// Scope definition
    pub fn scope(&self) -> &ScopeDefinition {
        &self.scope
    }

    /// Scope id
    pub fn id(&self) -> &ScopeId {
        &self.scope.id
    }

    /// Whether a store is attached
    pub fn is_active(&self) -> bool {
        self.store.read().is_some()
    }

    /// Attach a backing store, returning the one it replaces
    pub fn activate(&self, store: Arc<ContextualStore>) -> Option<Arc<ContextualStore>> {
        debug!(scope = %self.scope.id, "Context activated");
        self.store.write().replace(store)
    }

    /// Detach the backing store without destroying its instances
    pub fn deactivate(&self) -> Option<Arc<ContextualStore>> {
        let detached = self.store.write().take();
        if detached.is_some() {
            debug!(scope = %self.scope.id, "Context deactivated");
        }
        detached
    }

    /// Destroy every instance of the attached store, then detach it
    ///
    /// Returns the number of instances destroyed; an inactive context is left alone.
    pub fn invalidate(&self) -> usize {
        let Some(store) = self.deactivate() else {
            return 0;
        };
        let destroyed = store.destroy_all();
        debug!(scope = %self.scope.id, destroyed, "Context invalidated");
        destroyed
    }

    /// The attached store
    pub fn store(&self) -> Result<Arc<ContextualStore>> {
        self.store
            .read()
            .clone()
            .ok_or_else(|| Error::context_not_active(&self.scope.id))
    }

    /// The attached store, if active
    pub fn try_store(&self) -> Option<Arc<ContextualStore>> {
        self.store.read().clone()
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("scope", &self.scope.id)
            .field("active", &self.is_active())
            .finish()
    }
}
