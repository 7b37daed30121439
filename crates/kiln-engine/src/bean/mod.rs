//! Beans: descriptors bound to the code that creates them
//!
//! A [`BeanDefinition`] pairs raw [`TypeMetadata`] with a [`Behavior`]
//! (producer, lifecycle callbacks, typed views). After normalization the
//! bootstrap turns each definition into a [`Bean`], the unit the resolver
//! and the contextual stores work with.

mod builder;
mod creational;
mod dependents;

pub use builder::BeanBuilder;
pub use creational::CreationalContext;
pub use dependents::{DependentInstance, Dependents};

use kiln_domain::error::{Error, Result};
use kiln_domain::{ComponentDescriptor, ComponentId, ScopeId, TypeKey, TypeMetadata};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Type-erased live instance
pub type AnyInstance = Arc<dyn Any + Send + Sync>;

pub(crate) type CreateFn = dyn Fn(&mut CreationalContext) -> Result<AnyInstance> + Send + Sync;
pub(crate) type CallbackFn = dyn Fn(&AnyInstance) -> Result<()> + Send + Sync;
pub(crate) type ViewFn = dyn Fn(AnyInstance) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync;

/// How a component is created, initialized, destroyed and viewed as its types
pub struct Behavior {
    pub(crate) create: Box<CreateFn>,
    pub(crate) post_construct: Option<Box<CallbackFn>>,
    pub(crate) pre_destroy: Option<Box<CallbackFn>>,
    pub(crate) views: HashMap<TypeKey, Box<ViewFn>>,
}

impl Behavior {
    /// Whether instances can be viewed as `ty`
    pub fn exposes(&self, ty: &TypeKey) -> bool {
        self.views.contains_key(ty)
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Behavior")
            .field("views", &self.views.keys().collect::<Vec<_>>())
            .field("post_construct", &self.post_construct.is_some())
            .field("pre_destroy", &self.pre_destroy.is_some())
            .finish_non_exhaustive()
    }
}

/// Component metadata plus behaviour, before normalization
#[derive(Debug, Clone)]
pub struct BeanDefinition {
    /// Raw discovery metadata
    pub metadata: TypeMetadata,
    pub(crate) behavior: Arc<Behavior>,
}

impl BeanDefinition {
    /// Same behaviour under different metadata
    pub fn with_metadata(&self, metadata: TypeMetadata) -> Self {
        Self {
            metadata,
            behavior: Arc::clone(&self.behavior),
        }
    }

    /// Type keys the behaviour can produce views for
    pub fn exposed_types(&self) -> impl Iterator<Item = &TypeKey> {
        self.behavior.views.keys()
    }
}

/// A normalized, registered component
pub struct Bean {
    descriptor: ComponentDescriptor,
    behavior: Arc<Behavior>,
}

impl Bean {
    /// Start building a bean definition for `C`
    pub fn builder<C: Send + Sync + 'static>() -> BeanBuilder<C> {
        BeanBuilder::new()
    }

    pub(crate) fn new(descriptor: ComponentDescriptor, behavior: Arc<Behavior>) -> Self {
        Self {
            descriptor,
            behavior,
        }
    }

    /// Normalized descriptor
    pub fn descriptor(&self) -> &ComponentDescriptor {
        &self.descriptor
    }

    pub(crate) fn descriptor_mut(&mut self) -> &mut ComponentDescriptor {
        &mut self.descriptor
    }

    /// Component id
    pub fn id(&self) -> &ComponentId {
        &self.descriptor.id
    }

    /// Declared scope
    pub fn scope(&self) -> &ScopeId {
        &self.descriptor.scope
    }

    /// Whether instances can be viewed as `ty`
    pub fn exposes(&self, ty: &TypeKey) -> bool {
        self.behavior.exposes(ty)
    }

    /// View a live instance of this bean as `T`
    pub fn cast<T: ?Sized + Send + Sync + 'static>(&self, instance: &AnyInstance) -> Result<Arc<T>> {
        let key = TypeKey::of::<T>();
        let mismatch = || Error::type_mismatch(key.as_str(), self.id());
        let view = self.behavior.views.get(&key).ok_or_else(mismatch)?;
        let boxed = view(Arc::clone(instance)).ok_or_else(mismatch)?;
        boxed
            .downcast::<Arc<T>>()
            .map(|typed| *typed)
            .map_err(|_| mismatch())
    }

    /// Run the producer and the post-construct callback
    ///
    /// The caller owns `ctx` and destroys its dependents when this fails.
    pub(crate) fn create(&self, ctx: &mut CreationalContext) -> Result<AnyInstance> {
        let instance = (self.behavior.create)(ctx)?;
        if let Some(post_construct) = &self.behavior.post_construct {
            post_construct(&instance).map_err(|err| match err {
                Error::Creation { .. } => err,
                other => Error::Creation {
                    component: self.id().to_string(),
                    message: format!("post-construct callback failed: {other}"),
                    source: Some(Box::new(other)),
                },
            })?;
        }
        debug!(component = %self.id(), scope = %self.scope(), "Created instance");
        Ok(instance)
    }

    /// Run the pre-destroy callback; failures are logged, never propagated
    pub(crate) fn destroy_instance(&self, instance: &AnyInstance) {
        if let Some(pre_destroy) = &self.behavior.pre_destroy {
            if let Err(err) = pre_destroy(instance) {
                warn!(component = %self.id(), error = %err, "Pre-destroy callback failed");
            }
        }
        debug!(component = %self.id(), "Destroyed instance");
    }
}

impl fmt::Debug for Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bean")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.descriptor.fmt(f)
    }
}
