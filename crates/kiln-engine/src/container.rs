//! The running container
//!
//! [`Container`] is a cheap, cloneable handle produced by
//! [`Bootstrap::start`](crate::bootstrap::Bootstrap::start). Every lookup takes
//! the caller's [`ContextSet`]; the container itself holds only the
//! process-wide contexts.

use crate::bean::{AnyInstance, Bean, CreationalContext, DependentInstance, Dependents};
use crate::bootstrap::Extension;
use crate::config::KilnConfig;
use crate::contexts::{Context, ContextSet, ConversationRegistry, ScopeRegistry};
use crate::events::{AsyncDelivery, Dispatcher, Event};
use crate::instance::Instance;
use crate::interception::ChainCache;
use crate::proxy::{ClientProxy, ProxyHandle, Reference};
use crate::resolution::{Registry, Resolution, Resolver, describe_request};
use kiln_domain::error::{Error, Result};
use kiln_domain::events::ContainerShutdown;
use kiln_domain::{ComponentId, Qualifier, ScopeId, TypeKey};
use parking_lot::Mutex;
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

/// Shared state behind every [`Container`] handle
pub struct ContainerInner {
    this: Weak<ContainerInner>,
    config: KilnConfig,
    scopes: ScopeRegistry,
    shared: Vec<Arc<Context>>,
    affine: Mutex<Vec<Weak<Context>>>,
    pub(crate) resolver: Resolver,
    pub(crate) chains: ChainCache,
    dispatcher: Dispatcher,
    conversations: ConversationRegistry,
    extensions: Vec<Arc<dyn Extension>>,
    tracked: Mutex<Dependents>,
    running: AtomicBool,
    stopping: AtomicBool,
}

/// Everything the bootstrap hands over to a new container
pub(crate) struct ContainerParts {
    pub(crate) config: KilnConfig,
    pub(crate) scopes: ScopeRegistry,
    pub(crate) registry: Arc<Registry>,
    pub(crate) dispatcher: Dispatcher,
    pub(crate) extensions: Vec<Arc<dyn Extension>>,
}

impl ContainerInner {
    pub(crate) fn new(parts: ContainerParts) -> Arc<Self> {
        let ContainerParts {
            config,
            scopes,
            registry,
            dispatcher,
            extensions,
        } = parts;
        let shared = scopes
            .shared()
            .map(|scope| Arc::new(Context::active(scope.clone())))
            .collect();
        let chains = ChainCache::new(&config.deployment);
        Arc::new_cyclic(|this| Self {
            this: Weak::clone(this),
            config,
            scopes,
            shared,
            affine: Mutex::new(Vec::new()),
            resolver: Resolver::new(registry),
            chains,
            dispatcher,
            conversations: ConversationRegistry::new(),
            extensions,
            tracked: Mutex::new(Dependents::new()),
            running: AtomicBool::new(true),
            stopping: AtomicBool::new(false),
        })
    }

    pub(crate) fn registry(&self) -> &Registry {
        self.resolver.registry()
    }

    pub(crate) fn ensure_running(&self) -> Result<()> {
        if self.running.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(Error::illegal_state("the container has been shut down"))
        }
    }

    /// A fresh context set: the shared contexts plus new, inactive thread-affine ones
    pub(crate) fn contexts(&self) -> Result<ContextSet> {
        self.ensure_running()?;
        let affine: Vec<Arc<Context>> = self
            .scopes
            .thread_affine()
            .map(|scope| Arc::new(Context::new(scope.clone())))
            .collect();
        {
            let mut tracked = self.affine.lock();
            tracked.retain(|context| context.strong_count() > 0);
            tracked.extend(affine.iter().map(Arc::downgrade));
        }
        Ok(ContextSet::new(self.shared.iter().cloned().chain(affine)))
    }

    /// The single enabled component of type `ty` matching `qualifiers`
    pub(crate) fn resolve_bean(&self, ty: &TypeKey, qualifiers: &[Qualifier]) -> Result<Arc<Bean>> {
        self.ensure_running()?;
        self.resolver
            .resolve(ty, qualifiers)
            .into_single(|| describe_request(ty, qualifiers))
    }

    /// A reference to `bean` typed as `T`, as injected into a component being created by `chain`
    ///
    /// Dependent instances are created here and recorded in `dependents`.
    pub(crate) fn reference<T: ?Sized + Send + Sync + 'static>(
        &self,
        bean: Arc<Bean>,
        contexts: &ContextSet,
        chain: &[ComponentId],
        dependents: &mut Dependents,
    ) -> Result<Reference<T>> {
        let contract = TypeKey::of::<T>();
        if !bean.exposes(&contract) {
            return Err(Error::type_mismatch(contract.as_str(), bean.id()));
        }

        if self.scopes.is_normal(bean.scope()) {
            return Ok(Reference::proxied(ClientProxy::new(Weak::clone(&self.this), bean)));
        }

        if *bean.scope() == ScopeId::Dependent {
            let dependent = self.create_dependent(&bean, contexts, chain)?;
            let instance = match bean.cast::<T>(dependent.instance()) {
                Ok(instance) => instance,
                Err(err) => {
                    dependent.destroy();
                    return Err(err);
                }
            };
            dependents.push(dependent);
            return Ok(Reference::direct(Weak::clone(&self.this), bean, instance));
        }

        let instance = self.contextual_instance(&bean, contexts, chain)?;
        let typed = bean.cast::<T>(&instance)?;
        Ok(Reference::direct(Weak::clone(&self.this), bean, typed))
    }

    /// The live instance of `bean` in its scope's context, created if absent
    pub(crate) fn contextual_instance(
        &self,
        bean: &Arc<Bean>,
        contexts: &ContextSet,
        chain: &[ComponentId],
    ) -> Result<AnyInstance> {
        self.ensure_running()?;
        let store = contexts.store(bean.scope())?;
        store.get_or_create(bean, || self.create(bean, contexts, chain))
    }

    /// A new dependent instance of `bean`, owning whatever it injected
    pub(crate) fn create_dependent(
        &self,
        bean: &Arc<Bean>,
        contexts: &ContextSet,
        chain: &[ComponentId],
    ) -> Result<DependentInstance> {
        self.ensure_running()?;
        let (instance, dependents) = self.create(bean, contexts, chain)?;
        Ok(DependentInstance::new(Arc::clone(bean), instance, dependents))
    }

    /// Run the producer of `bean`
    ///
    /// On failure the dependents created so far are destroyed and nothing
    /// else is recorded.
    fn create(
        &self,
        bean: &Arc<Bean>,
        contexts: &ContextSet,
        chain: &[ComponentId],
    ) -> Result<(AnyInstance, Dependents)> {
        if chain.contains(bean.id()) {
            let path: Vec<&str> = chain
                .iter()
                .map(ComponentId::as_str)
                .chain(std::iter::once(bean.id().as_str()))
                .collect();
            return Err(Error::creation(
                bean.id(),
                format!("circular creation: {}", path.join(" -> ")),
            ));
        }
        let container = self
            .this
            .upgrade()
            .ok_or_else(|| Error::illegal_state("the container has been dropped"))?;

        let mut next = chain.to_vec();
        next.push(bean.id().clone());
        let mut ctx = CreationalContext::new(container, contexts.clone(), next);
        match bean.create(&mut ctx) {
            Ok(instance) => Ok((instance, ctx.into_dependents())),
            Err(err) => {
                let dependents = ctx.into_dependents();
                if !dependents.is_empty() {
                    debug!(component = %bean.id(), dependents = dependents.len(), "Destroying dependents of failed creation");
                }
                dependents.destroy();
                Err(err)
            }
        }
    }

    fn fire_erased(
        self: &Arc<Self>,
        contexts: &ContextSet,
        event: Arc<dyn Any + Send + Sync>,
        types: Vec<TypeKey>,
        qualifiers: &[Qualifier],
    ) -> Result<AsyncDelivery> {
        self.dispatcher.fire(self, contexts, event, types, qualifiers)
    }
}

impl std::fmt::Debug for ContainerInner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerInner")
            .field("registry", self.registry())
            .field("dispatcher", &self.dispatcher)
            .field("running", &self.running.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Handle on a running container
#[derive(Clone, Debug)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    pub(crate) fn from_inner(inner: Arc<ContainerInner>) -> Self {
        Self { inner }
    }

    /// Contexts for a new unit of work
    ///
    /// Shared scopes are already active. Thread-affine scopes (request,
    /// session, conversation, custom) start inactive; the host activates
    /// them at its own boundaries.
    pub fn contexts(&self) -> Result<ContextSet> {
        self.inner.contexts()
    }

    /// Outcome of a lookup, without creating anything
    pub fn resolution(&self, ty: &TypeKey, qualifiers: &[Qualifier]) -> Resolution {
        self.inner.resolver.resolve(ty, qualifiers)
    }

    /// Reference to the single component of type `T` matching `qualifiers`
    ///
    /// Dependent instances obtained here are owned by the container until
    /// [`release`](Self::release) or shutdown.
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(
        &self,
        contexts: &ContextSet,
        qualifiers: &[Qualifier],
    ) -> Result<Reference<T>> {
        let bean = self.inner.resolve_bean(&TypeKey::of::<T>(), qualifiers)?;
        self.track(bean, contexts)
    }

    /// Reference to the component registered under `name`
    pub fn resolve_named<T: ?Sized + Send + Sync + 'static>(
        &self,
        contexts: &ContextSet,
        name: &str,
    ) -> Result<Reference<T>> {
        self.inner.ensure_running()?;
        let bean = self
            .inner
            .resolver
            .resolve_named(name)
            .into_single(|| format!("@Named({name})"))?;
        self.track(bean, contexts)
    }

    /// Client proxy for the normal-scoped component of type `T` matching `qualifiers`
    pub fn proxy<T: ?Sized + Send + Sync + 'static>(&self, qualifiers: &[Qualifier]) -> Result<ClientProxy<T>> {
        let bean = self.inner.resolve_bean(&TypeKey::of::<T>(), qualifiers)?;
        self.proxy_for(bean)
    }

    /// Rebuild a passivated client proxy
    pub fn revive<T: ?Sized + Send + Sync + 'static>(&self, handle: &ProxyHandle) -> Result<ClientProxy<T>> {
        self.inner.ensure_running()?;
        let contract = TypeKey::of::<T>();
        if handle.contract != contract {
            return Err(Error::type_mismatch(contract.as_str(), &handle.component));
        }
        let bean = self
            .inner
            .registry()
            .bean(&handle.component)
            .cloned()
            .ok_or_else(|| Error::unsatisfied(format!("passivated component {}", handle.component)))?;
        self.proxy_for(bean)
    }

    /// Dynamic lookup handle for `T`
    pub fn instance<T: ?Sized + Send + Sync + 'static>(&self) -> Instance<T> {
        Instance::new(Arc::clone(&self.inner), Vec::new())
    }

    /// Fire `event` with `qualifiers`
    ///
    /// Returns once every synchronous observer has run; the handle tracks
    /// the asynchronous ones.
    pub fn fire<E: Event>(&self, contexts: &ContextSet, event: E, qualifiers: &[Qualifier]) -> Result<AsyncDelivery> {
        self.inner.ensure_running()?;
        let types = event.event_types();
        self.inner
            .fire_erased(contexts, Arc::new(event), types, qualifiers)
    }

    /// Long-running conversations
    pub fn conversations(&self) -> &ConversationRegistry {
        &self.inner.conversations
    }

    /// Destroy conversations idle for longer than the configured timeout
    pub fn sweep_conversations(&self) -> usize {
        self.inner
            .conversations
            .sweep_expired(self.inner.config.contexts.conversation_timeout())
    }

    /// Known scopes
    pub fn scopes(&self) -> &ScopeRegistry {
        &self.inner.scopes
    }

    /// Configuration the container was started with
    pub fn config(&self) -> &KilnConfig {
        &self.inner.config
    }

    /// Registered components
    pub fn registry(&self) -> &Registry {
        self.inner.registry()
    }

    /// Interception chains built so far
    pub fn chains(&self) -> &ChainCache {
        &self.inner.chains
    }

    /// Destroy a dependent instance obtained through [`resolve`](Self::resolve)
    ///
    /// Returns whether something was destroyed; references to contextual
    /// components are left alone.
    pub fn release<T: ?Sized>(&self, reference: &Reference<T>) -> bool {
        let Some(instance) = reference.instance() else {
            return false;
        };
        let taken = self.inner.tracked.lock().take(instance);
        taken.map(DependentInstance::destroy).is_some()
    }

    pub(crate) fn extensions(&self) -> &[Arc<dyn Extension>] {
        &self.inner.extensions
    }

    /// Whether the container accepts lookups
    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// Stop the container and destroy every instance
    ///
    /// Fires [`ContainerShutdown`], runs the extensions' shutdown hooks, then
    /// destroys thread-affine contexts (request, conversation, session,
    /// custom), conversations, dependents owned by the container, and finally
    /// the shared contexts (application, then singleton). Calling it again
    /// is a no-op.
    pub fn shutdown(&self) -> Result<()> {
        if self.inner.stopping.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        info!("Container shutting down");

        let contexts = self.contexts()?;
        match self.fire(&contexts, ContainerShutdown, &[]) {
            Ok(delivery) if !delivery.is_empty() => {
                debug!(observers = delivery.len(), "Shutdown delivered to asynchronous observers");
            }
            Ok(_) => {}
            Err(err) => warn!(error = %err, "Shutdown observer failed"),
        }
        for extension in &self.inner.extensions {
            if let Err(err) = extension.before_shutdown(self) {
                warn!(extension = extension.name(), error = %err, "Extension shutdown hook failed");
            }
        }

        self.inner.running.store(false, Ordering::Release);

        let mut affine: Vec<Arc<Context>> = self
            .inner
            .affine
            .lock()
            .drain(..)
            .filter_map(|context| context.upgrade())
            .collect();
        affine.sort_by_key(|context| context.scope().shutdown_rank());
        let mut destroyed: usize = affine.iter().map(|context| context.invalidate()).sum();

        destroyed += self.inner.conversations.destroy_all();
        let tracked = std::mem::take(&mut *self.inner.tracked.lock());
        destroyed += tracked.len();
        tracked.destroy();

        let mut shared: Vec<&Arc<Context>> = self.inner.shared.iter().collect();
        shared.sort_by_key(|context| context.scope().shutdown_rank());
        destroyed += shared.iter().map(|context| context.invalidate()).sum::<usize>();

        self.inner.dispatcher.shutdown();
        info!(destroyed, "Container shut down");
        Ok(())
    }

    fn track<T: ?Sized + Send + Sync + 'static>(&self, bean: Arc<Bean>, contexts: &ContextSet) -> Result<Reference<T>> {
        let mut dependents = Dependents::new();
        let reference = self.inner.reference(bean, contexts, &[], &mut dependents);
        self.inner.tracked.lock().append(dependents);
        reference
    }

    fn proxy_for<T: ?Sized + Send + Sync + 'static>(&self, bean: Arc<Bean>) -> Result<ClientProxy<T>> {
        if !self.inner.scopes.is_normal(bean.scope()) {
            return Err(Error::illegal_state(format!(
                "{} has scope '{}', which is not proxied",
                bean.id(),
                bean.scope()
            )));
        }
        let contract = TypeKey::of::<T>();
        if !bean.exposes(&contract) {
            return Err(Error::type_mismatch(contract.as_str(), bean.id()));
        }
        Ok(ClientProxy::new(Arc::downgrade(&self.inner), bean))
    }
}
