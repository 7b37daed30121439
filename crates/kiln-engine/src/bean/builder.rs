use crate::bean::{AnyInstance, BeanDefinition, Behavior, CallbackFn, CreationalContext, ViewFn};
use kiln_domain::error::{Error, Result};
use kiln_domain::{
    Annotation, ComponentId, InjectionPoint, InterceptorBinding, Qualifier, ScopeId, TypeKey,
    TypeMetadata,
};
use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

/// Builder for a [`BeanDefinition`] implemented by `C`
///
/// ```ignore
/// let definition = Bean::builder::<V8>()
///     .exposes::<dyn Engine>(|engine| engine)
///     .scope(ScopeId::Singleton)
///     .qualifier(Qualifier::new("Turbo"))
///     .build(|_| Ok(V8::default()));
/// ```
pub struct BeanBuilder<C> {
    metadata: TypeMetadata,
    views: HashMap<TypeKey, Box<ViewFn>>,
    post_construct: Option<Box<CallbackFn>>,
    pre_destroy: Option<Box<CallbackFn>>,
    _component: PhantomData<fn() -> C>,
}

impl<C: Send + Sync + 'static> BeanBuilder<C> {
    pub(crate) fn new() -> Self {
        let mut views: HashMap<TypeKey, Box<ViewFn>> = HashMap::new();
        views.insert(
            TypeKey::of::<C>(),
            Box::new(|instance: AnyInstance| {
                instance
                    .downcast::<C>()
                    .ok()
                    .map(|typed| Box::new(typed) as Box<dyn Any + Send + Sync>)
            }),
        );
        Self {
            metadata: TypeMetadata::new(std::any::type_name::<C>()).with_type(TypeKey::of::<C>()),
            views,
            post_construct: None,
            pre_destroy: None,
            _component: PhantomData,
        }
    }

    /// Override the class name (defaults to the Rust type name)
    pub fn class_name<S: Into<String>>(mut self, name: S) -> Self {
        self.metadata.class_name = name.into();
        self
    }

    /// Explicit component id (defaults to the class name)
    pub fn id<S: Into<ComponentId>>(self, id: S) -> Self {
        self.annotate(Annotation::Id(id.into()))
    }

    /// Add `T` to the type closure
    ///
    /// `view` converts the concrete instance, usually by unsizing:
    /// `.exposes::<dyn Engine>(|engine| engine)`.
    pub fn exposes<T: ?Sized + Send + Sync + 'static>(mut self, view: fn(Arc<C>) -> Arc<T>) -> Self {
        self.metadata = self.metadata.with_type(TypeKey::of::<T>());
        self.views.insert(
            TypeKey::of::<T>(),
            Box::new(move |instance: AnyInstance| {
                instance
                    .downcast::<C>()
                    .ok()
                    .map(|typed| Box::new(view(typed)) as Box<dyn Any + Send + Sync>)
            }),
        );
        self
    }

    /// Add an externally named type to the closure, without a typed view
    pub fn exposes_named(mut self, ty: TypeKey) -> Self {
        self.metadata = self.metadata.with_type(ty);
        self
    }

    /// Lifecycle scope (defaults to dependent)
    pub fn scope(self, scope: ScopeId) -> Self {
        self.annotate(Annotation::Scope(scope))
    }

    /// Add a qualifier
    pub fn qualifier(self, qualifier: Qualifier) -> Self {
        self.annotate(Annotation::Qualifier(qualifier))
    }

    /// Name for name-based lookup
    pub fn named<S: Into<String>>(self, name: S) -> Self {
        self.annotate(Annotation::Named(Some(name.into())))
    }

    /// Name derived from the simple class name
    pub fn default_named(self) -> Self {
        self.annotate(Annotation::Named(None))
    }

    /// Mark as an alternative
    pub fn alternative(self) -> Self {
        self.annotate(Annotation::Alternative)
    }

    /// Ordering key; enables an alternative
    pub fn priority(self, priority: i32) -> Self {
        self.annotate(Annotation::Priority(priority))
    }

    /// Override another component
    pub fn specializes<S: Into<ComponentId>>(self, target: S) -> Self {
        self.annotate(Annotation::Specializes(target.into()))
    }

    /// Component-level interceptor binding
    pub fn binding(self, binding: InterceptorBinding) -> Self {
        self.annotate(Annotation::InterceptorBinding(binding))
    }

    /// Interceptor binding on one method
    pub fn method_binding<S: Into<String>>(self, method: S, binding: InterceptorBinding) -> Self {
        self.annotate(Annotation::MethodBinding {
            method: method.into(),
            binding,
        })
    }

    /// Instances may be passivated
    pub fn passivation_capable(self) -> Self {
        self.annotate(Annotation::PassivationCapable)
    }

    /// Exclude from registration
    pub fn vetoed(self) -> Self {
        self.annotate(Annotation::Vetoed)
    }

    /// Declare a dependency, checked at validation time
    pub fn injects(mut self, point: InjectionPoint) -> Self {
        self.metadata = self.metadata.with_injection_point(point);
        self
    }

    /// Callback run after the producer; a failure discards the instance
    pub fn post_construct<F>(mut self, callback: F) -> Self
    where
        F: Fn(&C) -> Result<()> + Send + Sync + 'static,
    {
        self.post_construct = Some(typed_callback(callback));
        self
    }

    /// Callback run before the instance is released
    pub fn pre_destroy<F>(mut self, callback: F) -> Self
    where
        F: Fn(&C) -> Result<()> + Send + Sync + 'static,
    {
        self.pre_destroy = Some(typed_callback(callback));
        self
    }

    /// Finish with a producer
    pub fn build<F>(self, producer: F) -> BeanDefinition
    where
        F: Fn(&mut CreationalContext) -> Result<C> + Send + Sync + 'static,
    {
        BeanDefinition {
            metadata: self.metadata,
            behavior: Arc::new(Behavior {
                create: Box::new(move |ctx: &mut CreationalContext| {
                    producer(ctx).map(|c| Arc::new(c) as AnyInstance)
                }),
                post_construct: self.post_construct,
                pre_destroy: self.pre_destroy,
                views: self.views,
            }),
        }
    }

    /// Finish with `C::default()` as the producer
    pub fn build_default(self) -> BeanDefinition
    where
        C: Default,
    {
        self.build(|_| Ok(C::default()))
    }

    fn annotate(mut self, annotation: Annotation) -> Self {
        self.metadata = self.metadata.with_annotation(annotation);
        self
    }
}

fn typed_callback<C, F>(callback: F) -> Box<CallbackFn>
where
    C: Send + Sync + 'static,
    F: Fn(&C) -> Result<()> + Send + Sync + 'static,
{
    Box::new(move |instance: &AnyInstance| {
        let typed = instance
            .downcast_ref::<C>()
            .ok_or_else(|| Error::type_mismatch(std::any::type_name::<C>(), "lifecycle callback"))?;
        callback(typed)
    })
}
