use crate::bean::{AnyInstance, Bean};
use crate::container::{Container, ContainerInner};
use crate::contexts::ContextSet;
use crate::events::Event;
use kiln_domain::constants::DEFAULT_OBSERVER_PRIORITY;
use kiln_domain::error::{Error, Result};
use kiln_domain::{ComponentId, ObserverDescriptor, ObserverMode, Qualifier, Reception, TypeKey};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

type HandlerFn = dyn Fn(&ObserverContext<'_>) -> Result<()> + Send + Sync;

/// What an observer sees of one notification
pub struct ObserverContext<'a> {
    pub(crate) event: &'a (dyn Any + Send + Sync),
    pub(crate) qualifiers: &'a [Qualifier],
    pub(crate) contexts: &'a ContextSet,
    pub(crate) container: &'a Arc<ContainerInner>,
    pub(crate) owner: Option<(&'a Arc<Bean>, &'a AnyInstance)>,
}

impl ObserverContext<'_> {
    /// The event, if it is an `E`
    pub fn event<E: Any>(&self) -> Option<&E> {
        self.event.downcast_ref::<E>()
    }

    /// Qualifiers the event was fired with
    pub fn qualifiers(&self) -> &[Qualifier] {
        self.qualifiers
    }

    /// Contexts of the notification
    ///
    /// The firing unit of work for synchronous observers, a fresh set with
    /// an active request context for asynchronous ones.
    pub fn contexts(&self) -> &ContextSet {
        self.contexts
    }

    /// Handle on the container, e.g. to fire follow-up events
    pub fn container(&self) -> Container {
        Container::from_inner(Arc::clone(self.container))
    }

    /// The owning instance viewed as `C`
    pub fn owner<C: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<C>> {
        let (bean, instance) = self
            .owner
            .ok_or_else(|| Error::illegal_state("static observers have no owning instance"))?;
        bean.cast::<C>(instance)
    }
}

/// An observer method bound to its handler
#[derive(Clone)]
pub struct Observer {
    descriptor: ObserverDescriptor,
    declared_priority: bool,
    handler: Arc<HandlerFn>,
}

impl Observer {
    /// Start an observer of `E`
    pub fn of<E: Event>(id: impl Into<String>) -> ObserverBuilder {
        Self::of_type(id, TypeKey::of::<E>())
    }

    /// Start an observer of an externally named type
    pub fn of_type(id: impl Into<String>, observed_type: TypeKey) -> ObserverBuilder {
        ObserverBuilder {
            descriptor: ObserverDescriptor {
                id: id.into(),
                observed_type,
                qualifiers: Vec::new(),
                priority: DEFAULT_OBSERVER_PRIORITY,
                owner: None,
                mode: ObserverMode::Sync,
                reception: Reception::Always,
                tolerant: false,
                discovery_index: 0,
            },
            declared_priority: false,
        }
    }

    /// Metadata
    pub fn descriptor(&self) -> &ObserverDescriptor {
        &self.descriptor
    }

    /// Observer id
    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub(crate) fn notify(&self, ctx: &ObserverContext<'_>) -> Result<()> {
        (self.handler)(ctx)
    }

    pub(crate) fn normalize(&mut self, discovery_index: usize, default_priority: i32) {
        self.descriptor.discovery_index = discovery_index;
        if !self.declared_priority {
            self.descriptor.priority = default_priority;
        }
    }
}

impl fmt::Debug for Observer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observer")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Builder for an [`Observer`]
#[derive(Debug, Clone)]
pub struct ObserverBuilder {
    descriptor: ObserverDescriptor,
    declared_priority: bool,
}

impl ObserverBuilder {
    /// Only observe events fired with `qualifier`
    pub fn qualifier(mut self, qualifier: Qualifier) -> Self {
        self.descriptor.qualifiers.push(qualifier);
        self
    }

    /// Ordering key; lower observes first
    pub fn priority(mut self, priority: i32) -> Self {
        self.descriptor.priority = priority;
        self.declared_priority = true;
        self
    }

    /// Deliver on the worker pool
    pub fn asynchronous(mut self) -> Self {
        self.descriptor.mode = ObserverMode::Async;
        self
    }

    /// Failures are logged instead of aborting synchronous dispatch
    pub fn tolerant(mut self) -> Self {
        self.descriptor.tolerant = true;
        self
    }

    /// Only notify when the owning instance already exists
    pub fn if_exists(mut self) -> Self {
        self.descriptor.reception = Reception::IfExists;
        self
    }

    /// Static observer receiving the event as `E`
    pub fn notify<E, F>(self, handler: F) -> Observer
    where
        E: Event,
        F: Fn(&E, &ObserverContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        let id = self.descriptor.id.clone();
        self.notify_any(move |ctx: &ObserverContext<'_>| {
            let event = ctx
                .event::<E>()
                .ok_or_else(|| Error::type_mismatch(std::any::type_name::<E>(), &id))?;
            handler(event, ctx)
        })
    }

    /// Static observer receiving the type-erased event
    pub fn notify_any<F>(self, handler: F) -> Observer
    where
        F: Fn(&ObserverContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        Observer {
            descriptor: self.descriptor,
            declared_priority: self.declared_priority,
            handler: Arc::new(handler),
        }
    }

    /// Observer method of component `owner`, receiving its instance as `C`
    pub fn on_component<C, E, F>(mut self, owner: impl Into<ComponentId>, handler: F) -> Observer
    where
        C: ?Sized + Send + Sync + 'static,
        E: Event,
        F: Fn(&C, &E, &ObserverContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.descriptor.owner = Some(owner.into());
        let id = self.descriptor.id.clone();
        self.notify_any(move |ctx: &ObserverContext<'_>| {
            let instance = ctx.owner::<C>()?;
            let event = ctx
                .event::<E>()
                .ok_or_else(|| Error::type_mismatch(std::any::type_name::<E>(), &id))?;
            handler(&instance, event, ctx)
        })
    }
}
