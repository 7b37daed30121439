use crate::bean::Dependents;
use crate::container::{Container, ContainerInner};
use crate::contexts::ContextSet;
use crate::instance::Instance;
use crate::proxy::Reference;
use crate::resolution::Resolution;
use kiln_domain::error::Result;
use kiln_domain::{ComponentId, Qualifier, TypeKey};
use std::sync::Arc;

/// Handed to a producer while its component is being created
///
/// Injected dependent-scoped instances are recorded here and end up owned
/// by the instance under construction; they are destroyed with it, or right
/// away if construction fails. Normal-scoped dependencies are injected as
/// client proxies, so construction never sees another component's
/// half-built instance.
pub struct CreationalContext {
    container: Arc<ContainerInner>,
    contexts: ContextSet,
    chain: Vec<ComponentId>,
    dependents: Dependents,
}

impl CreationalContext {
    pub(crate) fn new(container: Arc<ContainerInner>, contexts: ContextSet, chain: Vec<ComponentId>) -> Self {
        Self {
            container,
            contexts,
            chain,
            dependents: Dependents::new(),
        }
    }

    /// Component under construction
    pub fn component(&self) -> Option<&ComponentId> {
        self.chain.last()
    }

    /// Components whose creation led here, outermost first
    pub fn chain(&self) -> &[ComponentId] {
        &self.chain
    }

    /// Contexts of the unit of work that triggered the creation
    pub fn contexts(&self) -> &ContextSet {
        &self.contexts
    }

    /// Handle on the owning container
    pub fn container(&self) -> Container {
        Container::from_inner(Arc::clone(&self.container))
    }

    /// Inject the single component of type `T` matching `qualifiers`
    pub fn inject<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        qualifiers: &[Qualifier],
    ) -> Result<Reference<T>> {
        let bean = self.container.resolve_bean(&TypeKey::of::<T>(), qualifiers)?;
        self.container
            .reference(bean, &self.contexts, &self.chain, &mut self.dependents)
    }

    /// Like [`inject`](Self::inject), but `None` when nothing matches
    pub fn inject_optional<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        qualifiers: &[Qualifier],
    ) -> Result<Option<Reference<T>>> {
        match self.container.resolver.resolve(&TypeKey::of::<T>(), qualifiers) {
            Resolution::Unsatisfied => Ok(None),
            _ => self.inject(qualifiers).map(Some),
        }
    }

    /// Inject the component registered under `name`
    pub fn inject_named<T: ?Sized + Send + Sync + 'static>(&mut self, name: &str) -> Result<Reference<T>> {
        let bean = self
            .container
            .resolver
            .resolve_named(name)
            .into_single(|| format!("@Named({name})"))?;
        self.container
            .reference(bean, &self.contexts, &self.chain, &mut self.dependents)
    }

    /// Dynamic lookup handle
    pub fn instance<T: ?Sized + Send + Sync + 'static>(&self) -> Instance<T> {
        Instance::new(Arc::clone(&self.container), Vec::new())
    }

    pub(crate) fn into_dependents(self) -> Dependents {
        self.dependents
    }
}
