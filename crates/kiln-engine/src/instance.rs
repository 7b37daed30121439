//! Dynamic lookup
//!
//! [`Instance`] defers resolution to the call site: narrow it with
//! [`select`](Instance::select), check it with
//! [`is_resolvable`](Instance::is_resolvable), then [`get`](Instance::get)
//! one reference or [`iter`](Instance::iter) over every match. Dependent
//! instances obtained through it belong to it and are destroyed with it.

use crate::bean::{Bean, Dependents};
use crate::container::ContainerInner;
use crate::contexts::ContextSet;
use crate::proxy::Reference;
use crate::resolution::Resolution;
use kiln_domain::error::Result;
use kiln_domain::{Qualifier, TypeKey};
use parking_lot::Mutex;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Lookup handle for components of type `T`
pub struct Instance<T: ?Sized> {
    container: Arc<ContainerInner>,
    qualifiers: Vec<Qualifier>,
    dependents: Mutex<Dependents>,
    _contract: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> Instance<T> {
    pub(crate) fn new(container: Arc<ContainerInner>, qualifiers: Vec<Qualifier>) -> Self {
        Self {
            container,
            qualifiers,
            dependents: Mutex::new(Dependents::new()),
            _contract: PhantomData,
        }
    }

    /// A narrower handle also requiring `qualifiers`
    pub fn select(&self, qualifiers: &[Qualifier]) -> Instance<T> {
        let mut combined = self.qualifiers.clone();
        combined.extend(qualifiers.iter().cloned());
        Instance::new(Arc::clone(&self.container), combined)
    }

    /// Required qualifiers
    pub fn qualifiers(&self) -> &[Qualifier] {
        &self.qualifiers
    }

    /// Current lookup outcome
    pub fn resolution(&self) -> Resolution {
        self.container
            .resolver
            .resolve(&TypeKey::of::<T>(), &self.qualifiers)
    }

    /// Whether nothing matches
    pub fn is_unsatisfied(&self) -> bool {
        self.resolution().is_unsatisfied()
    }

    /// Whether several components match
    pub fn is_ambiguous(&self) -> bool {
        self.resolution().is_ambiguous()
    }

    /// Whether exactly one component matches
    pub fn is_resolvable(&self) -> bool {
        self.resolution().is_resolved()
    }

    /// Reference to the single match
    pub fn get(&self, contexts: &ContextSet) -> Result<Reference<T>> {
        let bean = self
            .container
            .resolve_bean(&TypeKey::of::<T>(), &self.qualifiers)?;
        self.reference(bean, contexts)
    }

    /// References to every match, created lazily
    pub fn iter<'a>(&'a self, contexts: &ContextSet) -> impl Iterator<Item = Result<Reference<T>>> + 'a {
        let contexts = contexts.clone();
        self.resolution()
            .beans()
            .into_iter()
            .map(move |bean| self.reference(bean, &contexts))
    }

    /// Destroy an instance obtained through this handle
    ///
    /// Dependent instances are destroyed directly; for proxies the live
    /// instance in `contexts` is destroyed and the next call creates a new
    /// one. Returns whether something was destroyed.
    pub fn destroy(&self, contexts: &ContextSet, reference: &Reference<T>) -> Result<bool> {
        if reference.is_proxy() {
            let bean = reference.bean();
            return Ok(contexts.store(bean.scope())?.destroy(bean.id()));
        }
        let Some(instance) = reference.instance() else {
            return Ok(false);
        };
        let taken = self.dependents.lock().take(instance);
        Ok(taken.map(|dependent| dependent.destroy()).is_some())
    }

    fn reference(&self, bean: Arc<Bean>, contexts: &ContextSet) -> Result<Reference<T>> {
        let mut dependents = self.dependents.lock();
        self.container.reference(bean, contexts, &[], &mut dependents)
    }
}

impl<T: ?Sized> Drop for Instance<T> {
    fn drop(&mut self) {
        std::mem::take(self.dependents.get_mut()).destroy();
    }
}

impl<T: ?Sized> fmt::Debug for Instance<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("contract", &std::any::type_name::<T>())
            .field("qualifiers", &self.qualifiers)
            .field("dependents", &self.dependents.lock().len())
            .finish()
    }
}
