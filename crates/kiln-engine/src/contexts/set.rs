//! Context sets
//!
//! A [`ContextSet`] is the explicit handle a unit of work passes to every
//! lookup, in place of ambient thread-local state. It shares the process-wide
//! contexts with every other set and owns its thread-affine ones. Handing
//! work to another thread is explicit: take a [`ContextSnapshot`], attach it
//! on the worker, and deactivate the worker's set afterwards.

use crate::container::Container;
use crate::contexts::{Context, ContextualStore};
use kiln_domain::ScopeId;
use kiln_domain::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;

/// The contexts visible to one unit of work
#[derive(Clone)]
pub struct ContextSet {
    contexts: Arc<HashMap<ScopeId, Arc<Context>>>,
}

impl ContextSet {
    pub(crate) fn new<I>(contexts: I) -> Self
    where
        I: IntoIterator<Item = Arc<Context>>,
    {
        Self {
            contexts: Arc::new(
                contexts
                    .into_iter()
                    .map(|context| (context.id().clone(), context))
                    .collect(),
            ),
        }
    }

    /// Context of a scope
    pub fn context(&self, scope: &ScopeId) -> Result<&Arc<Context>> {
        if *scope == ScopeId::Dependent {
            return Err(Error::illegal_state(
                "the dependent pseudo-scope has no context",
            ));
        }
        self.contexts
            .get(scope)
            .ok_or_else(|| Error::illegal_state(format!("unknown scope '{scope}'")))
    }

    /// Store attached to a scope's context
    pub fn store(&self, scope: &ScopeId) -> Result<Arc<ContextualStore>> {
        self.context(scope)?.store()
    }

    /// Whether a scope's context is active
    pub fn is_active(&self, scope: &ScopeId) -> bool {
        self.contexts
            .get(scope)
            .is_some_and(|context| context.is_active())
    }

    /// Activate a thread-affine scope with a backing store
    ///
    /// Shared scopes are activated by the container and cannot be switched.
    pub fn activate(&self, scope: &ScopeId, store: Arc<ContextualStore>) -> Result<()> {
        self.affine(scope)?.activate(store);
        Ok(())
    }

    /// Activate a thread-affine scope with a fresh store, returning it
    pub fn begin(&self, scope: &ScopeId) -> Result<Arc<ContextualStore>> {
        let store = ContextualStore::new_shared();
        self.activate(scope, Arc::clone(&store))?;
        Ok(store)
    }

    /// Detach a scope's store without destroying its instances
    pub fn deactivate(&self, scope: &ScopeId) -> Result<Option<Arc<ContextualStore>>> {
        Ok(self.affine(scope)?.deactivate())
    }

    /// Destroy a scope's instances and detach its store
    pub fn invalidate(&self, scope: &ScopeId) -> Result<usize> {
        Ok(self.affine(scope)?.invalidate())
    }

    /// Scopes currently active in this set
    pub fn active_scopes(&self) -> Vec<ScopeId> {
        let mut scopes: Vec<ScopeId> = self
            .contexts
            .values()
            .filter(|context| context.is_active())
            .map(|context| context.id().clone())
            .collect();
        scopes.sort();
        scopes
    }

    /// Capture the stores of the active thread-affine contexts
    pub fn snapshot(&self) -> ContextSnapshot {
        let mut stores: Vec<(ScopeId, Arc<ContextualStore>)> = self
            .affine_contexts()
            .filter_map(|context| context.try_store().map(|store| (context.id().clone(), store)))
            .collect();
        stores.sort_by(|a, b| a.0.cmp(&b.0));
        ContextSnapshot { stores }
    }

    /// Detach every thread-affine store without destroying anything
    pub fn deactivate_all(&self) {
        for context in self.affine_contexts() {
            context.deactivate();
        }
    }

    pub(crate) fn affine_contexts(&self) -> impl Iterator<Item = &Arc<Context>> {
        self.contexts.values().filter(|context| !context.scope().shared)
    }

    fn affine(&self, scope: &ScopeId) -> Result<&Arc<Context>> {
        let context = self.context(scope)?;
        if context.scope().shared {
            return Err(Error::illegal_state(format!(
                "scope '{scope}' is shared and managed by the container"
            )));
        }
        Ok(context)
    }
}

impl std::fmt::Debug for ContextSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextSet")
            .field("active", &self.active_scopes())
            .finish()
    }
}

/// Active thread-affine stores captured for another thread
#[derive(Debug, Clone)]
pub struct ContextSnapshot {
    stores: Vec<(ScopeId, Arc<ContextualStore>)>,
}

impl ContextSnapshot {
    /// Captured scopes
    pub fn scopes(&self) -> impl Iterator<Item = &ScopeId> {
        self.stores.iter().map(|(scope, _)| scope)
    }

    /// Whether nothing was active when the snapshot was taken
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }

    /// A new context set with the captured stores activated
    ///
    /// The worker sees the same instances as the originating unit of work.
    /// Call [`ContextSet::deactivate_all`] when done; the originating unit
    /// of work stays responsible for invalidation.
    pub fn attach(&self, container: &Container) -> Result<ContextSet> {
        let contexts = container.contexts()?;
        for (scope, store) in &self.stores {
            contexts.activate(scope, Arc::clone(store))?;
        }
        Ok(contexts)
    }
}
