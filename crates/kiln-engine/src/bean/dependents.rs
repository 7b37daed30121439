use crate::bean::{AnyInstance, Bean};
use std::sync::Arc;

/// A dependent-scoped instance and everything created for it
pub struct DependentInstance {
    bean: Arc<Bean>,
    instance: AnyInstance,
    dependents: Dependents,
}

impl DependentInstance {
    pub(crate) fn new(bean: Arc<Bean>, instance: AnyInstance, dependents: Dependents) -> Self {
        Self {
            bean,
            instance,
            dependents,
        }
    }

    /// Bean the instance belongs to
    pub fn bean(&self) -> &Arc<Bean> {
        &self.bean
    }

    /// The live instance
    pub fn instance(&self) -> &AnyInstance {
        &self.instance
    }

    /// Whether this is the same allocation as `other`
    pub(crate) fn is_instance<T: ?Sized>(&self, other: &Arc<T>) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.instance), Arc::as_ptr(other))
    }

    /// Destroy the instance, then its own dependents
    pub fn destroy(self) {
        self.bean.destroy_instance(&self.instance);
        self.dependents.destroy();
    }
}

/// Dependent instances owned by one declaring instance
///
/// Destroyed together with the declaring instance, or immediately when its
/// construction fails. Dropping without [`Dependents::destroy`] skips the
/// pre-destroy callbacks, so every owner destroys explicitly.
#[derive(Default)]
pub struct Dependents(Vec<DependentInstance>);

impl Dependents {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, dependent: DependentInstance) {
        self.0.push(dependent);
    }

    pub(crate) fn append(&mut self, mut other: Dependents) {
        self.0.append(&mut other.0);
    }

    /// Remove the dependent holding `instance`
    pub(crate) fn take<T: ?Sized>(&mut self, instance: &Arc<T>) -> Option<DependentInstance> {
        let position = self.0.iter().position(|d| d.is_instance(instance))?;
        Some(self.0.remove(position))
    }

    /// Number of direct dependents
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no dependents
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Destroy every dependent, most recently created first
    pub fn destroy(self) {
        for dependent in self.0.into_iter().rev() {
            dependent.destroy();
        }
    }
}

impl std::fmt::Debug for Dependents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.0.iter().map(|d| d.bean.id()))
            .finish()
    }
}
