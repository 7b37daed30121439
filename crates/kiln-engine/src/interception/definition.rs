use crate::interception::{InvocationContext, ReturnValue};
use kiln_domain::error::Result;
use kiln_domain::{
    ComponentId, DecoratorDescriptor, InterceptorBinding, InterceptorDescriptor, Qualifier, TypeKey,
};
use std::fmt;
use std::sync::Arc;

/// Around-invoke interceptor
///
/// Returning without calling [`InvocationContext::proceed`] short-circuits
/// the call; the returned value becomes the call's result.
///
/// The target method runs at most once per invocation, because its body
/// consumes the call's arguments. A second `proceed` that reaches the target
/// fails with [`Error::IllegalState`](kiln_domain::error::Error::IllegalState),
/// so retrying interceptors must retry around the whole call instead.
pub trait Interceptor: Send + Sync {
    /// Wrap one invocation
    fn around_invoke(&self, ctx: &mut InvocationContext<'_>) -> Result<ReturnValue>;
}

/// Decorator of a component type
///
/// [`InvocationContext::proceed`] delegates to the next decorator, or to the
/// interceptor-wrapped target once every decorator has run.
pub trait Decorator: Send + Sync {
    /// Whether this decorator implements `method`; other methods bypass it
    fn decorates(&self, method: &str) -> bool {
        let _ = method;
        true
    }

    /// Handle one invocation on behalf of the delegate
    fn invoke(&self, delegate: &mut InvocationContext<'_>) -> Result<ReturnValue>;
}

struct FnInterceptor<F>(F);

impl<F> Interceptor for FnInterceptor<F>
where
    F: Fn(&mut InvocationContext<'_>) -> Result<ReturnValue> + Send + Sync,
{
    fn around_invoke(&self, ctx: &mut InvocationContext<'_>) -> Result<ReturnValue> {
        (self.0)(ctx)
    }
}

struct FnDecorator<F> {
    methods: Option<Vec<String>>,
    invoke: F,
}

impl<F> Decorator for FnDecorator<F>
where
    F: Fn(&mut InvocationContext<'_>) -> Result<ReturnValue> + Send + Sync,
{
    fn decorates(&self, method: &str) -> bool {
        self.methods
            .as_ref()
            .is_none_or(|methods| methods.iter().any(|m| m == method))
    }

    fn invoke(&self, delegate: &mut InvocationContext<'_>) -> Result<ReturnValue> {
        (self.invoke)(delegate)
    }
}

/// An interceptor and its metadata
#[derive(Clone)]
pub struct InterceptorDefinition {
    descriptor: InterceptorDescriptor,
    interceptor: Arc<dyn Interceptor>,
}

impl InterceptorDefinition {
    /// Interceptor with no binding yet
    pub fn new<S, I>(id: S, interceptor: I) -> Self
    where
        S: Into<ComponentId>,
        I: Interceptor + 'static,
    {
        Self {
            descriptor: InterceptorDescriptor {
                id: id.into(),
                bindings: Vec::new(),
                priority: None,
                discovery_index: 0,
            },
            interceptor: Arc::new(interceptor),
        }
    }

    /// Interceptor implemented by a closure
    pub fn from_fn<S, F>(id: S, around_invoke: F) -> Self
    where
        S: Into<ComponentId>,
        F: Fn(&mut InvocationContext<'_>) -> Result<ReturnValue> + Send + Sync + 'static,
    {
        Self::new(id, FnInterceptor(around_invoke))
    }

    /// Add a binding the intercepted component or method must carry
    pub fn bind(mut self, binding: InterceptorBinding) -> Self {
        self.descriptor.bindings.push(binding);
        self
    }

    /// Ordering key; also enables the interceptor
    pub fn priority(mut self, priority: i32) -> Self {
        self.descriptor.priority = Some(priority);
        self
    }

    /// Metadata
    pub fn descriptor(&self) -> &InterceptorDescriptor {
        &self.descriptor
    }

    /// Interceptor id
    pub fn id(&self) -> &ComponentId {
        &self.descriptor.id
    }

    pub(crate) fn interceptor(&self) -> &dyn Interceptor {
        self.interceptor.as_ref()
    }

    pub(crate) fn set_discovery_index(&mut self, index: usize) {
        self.descriptor.discovery_index = index;
    }
}

impl fmt::Debug for InterceptorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorDefinition")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// A decorator and its metadata
#[derive(Clone)]
pub struct DecoratorDefinition {
    descriptor: DecoratorDescriptor,
    decorator: Arc<dyn Decorator>,
}

impl DecoratorDefinition {
    /// Decorator of `T`
    pub fn new<T, S, D>(id: S, decorator: D) -> Self
    where
        T: ?Sized + 'static,
        S: Into<ComponentId>,
        D: Decorator + 'static,
    {
        Self {
            descriptor: DecoratorDescriptor {
                id: id.into(),
                decorated_types: vec![TypeKey::of::<T>()],
                delegate_qualifiers: Vec::new(),
                priority: None,
                discovery_index: 0,
            },
            decorator: Arc::new(decorator),
        }
    }

    /// Decorator of `T` implemented by a closure, applied to every method
    pub fn from_fn<T, S, F>(id: S, invoke: F) -> Self
    where
        T: ?Sized + 'static,
        S: Into<ComponentId>,
        F: Fn(&mut InvocationContext<'_>) -> Result<ReturnValue> + Send + Sync + 'static,
    {
        Self::new::<T, _, _>(
            id,
            FnDecorator {
                methods: None,
                invoke,
            },
        )
    }

    /// Decorator of `T` implemented by a closure, applied to the listed methods only
    pub fn for_methods<T, S, F>(id: S, methods: &[&str], invoke: F) -> Self
    where
        T: ?Sized + 'static,
        S: Into<ComponentId>,
        F: Fn(&mut InvocationContext<'_>) -> Result<ReturnValue> + Send + Sync + 'static,
    {
        Self::new::<T, _, _>(
            id,
            FnDecorator {
                methods: Some(methods.iter().map(|m| (*m).to_string()).collect()),
                invoke,
            },
        )
    }

    /// Restrict to delegates carrying `qualifier`
    pub fn delegate_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.descriptor.delegate_qualifiers.push(qualifier);
        self
    }

    /// Ordering key; also enables the decorator
    pub fn priority(mut self, priority: i32) -> Self {
        self.descriptor.priority = Some(priority);
        self
    }

    /// Metadata
    pub fn descriptor(&self) -> &DecoratorDescriptor {
        &self.descriptor
    }

    /// Decorator id
    pub fn id(&self) -> &ComponentId {
        &self.descriptor.id
    }

    pub(crate) fn decorator(&self) -> &dyn Decorator {
        self.decorator.as_ref()
    }

    pub(crate) fn set_discovery_index(&mut self, index: usize) {
        self.descriptor.discovery_index = index;
    }
}

impl fmt::Debug for DecoratorDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoratorDefinition")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}
