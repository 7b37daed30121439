use crate::bean::Bean;
use crate::container::ContainerInner;
use crate::contexts::ContextSet;
use crate::interception::{self, Invocation, Parameter};
use crate::proxy::ClientProxy;
use kiln_domain::ComponentId;
use kiln_domain::error::{Error, Result};
use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

enum Kind<T: ?Sized> {
    Direct {
        container: Weak<ContainerInner>,
        bean: Arc<Bean>,
        instance: Arc<T>,
    },
    Proxied(ClientProxy<T>),
}

/// An injected dependency
///
/// Dependent and singleton components are injected as the instance itself;
/// normal-scoped components as a [`ClientProxy`]. Both go through the
/// component's interception chain on [`call`](Self::call).
pub struct Reference<T: ?Sized> {
    kind: Kind<T>,
}

impl<T: ?Sized + Send + Sync + 'static> Reference<T> {
    pub(crate) fn direct(container: Weak<ContainerInner>, bean: Arc<Bean>, instance: Arc<T>) -> Self {
        Self {
            kind: Kind::Direct {
                container,
                bean,
                instance,
            },
        }
    }

    pub(crate) fn proxied(proxy: ClientProxy<T>) -> Self {
        Self {
            kind: Kind::Proxied(proxy),
        }
    }

    /// The instance; for proxies, the live instance in `contexts`
    pub fn get(&self, contexts: &ContextSet) -> Result<Arc<T>> {
        match &self.kind {
            Kind::Direct { instance, .. } => Ok(Arc::clone(instance)),
            Kind::Proxied(proxy) => proxy.get(contexts),
        }
    }

    /// Call `f` through the interception chain of `method`
    pub fn invoke<R, F>(&self, contexts: &ContextSet, method: &str, f: F) -> Result<R>
    where
        R: Any + Send,
        F: FnOnce(&T) -> Result<R>,
    {
        self.call(contexts, Invocation::new(method), |target, _| f(target))
    }

    /// Call `body` through the interception chain, with arguments
    pub fn call<R, F>(&self, contexts: &ContextSet, invocation: Invocation, body: F) -> Result<R>
    where
        R: Any + Send,
        F: FnOnce(&T, &[Parameter]) -> Result<R>,
    {
        match &self.kind {
            Kind::Direct {
                container,
                bean,
                instance,
            } => {
                let container = container.upgrade().ok_or_else(|| {
                    Error::illegal_state(format!("reference to {} outlived its container", bean.id()))
                })?;
                interception::run(
                    &container.chains,
                    container.registry(),
                    bean,
                    instance.as_ref(),
                    invocation,
                    body,
                )
            }
            Kind::Proxied(proxy) => proxy.call(contexts, invocation, body),
        }
    }
}

impl<T: ?Sized> Reference<T> {
    /// Target component id
    pub fn component(&self) -> &ComponentId {
        self.bean().id()
    }

    /// Target bean
    pub fn bean(&self) -> &Arc<Bean> {
        match &self.kind {
            Kind::Direct { bean, .. } => bean,
            Kind::Proxied(proxy) => proxy.bean(),
        }
    }

    /// Whether calls are forwarded through a client proxy
    pub fn is_proxy(&self) -> bool {
        matches!(self.kind, Kind::Proxied(_))
    }

    /// The client proxy, for normal-scoped components
    pub fn proxy(&self) -> Option<&ClientProxy<T>> {
        match &self.kind {
            Kind::Proxied(proxy) => Some(proxy),
            Kind::Direct { .. } => None,
        }
    }

    /// The instance, for dependent and singleton components
    pub fn instance(&self) -> Option<&Arc<T>> {
        match &self.kind {
            Kind::Direct { instance, .. } => Some(instance),
            Kind::Proxied(_) => None,
        }
    }
}

impl<T: ?Sized> Clone for Reference<T> {
    fn clone(&self) -> Self {
        let kind = match &self.kind {
            Kind::Direct {
                container,
                bean,
                instance,
            } => Kind::Direct {
                container: Weak::clone(container),
                bean: Arc::clone(bean),
                instance: Arc::clone(instance),
            },
            Kind::Proxied(proxy) => Kind::Proxied(proxy.clone()),
        };
        Self { kind }
    }
}

impl<T: ?Sized> fmt::Debug for Reference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            Kind::Direct { bean, .. } => f
                .debug_struct("Reference")
                .field("component", bean.id())
                .field("proxied", &false)
                .finish(),
            Kind::Proxied(proxy) => f
                .debug_struct("Reference")
                .field("component", proxy.bean().id())
                .field("proxied", &true)
                .finish(),
        }
    }
}
