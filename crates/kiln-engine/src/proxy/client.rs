use crate::bean::Bean;
use crate::container::ContainerInner;
use crate::contexts::ContextSet;
use crate::interception::{self, Invocation, Parameter};
use crate::proxy::ProxyHandle;
use kiln_domain::error::{Error, Result};
use kiln_domain::{ComponentId, TypeKey};
use serde::{Serialize, Serializer};
use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::{Arc, Weak};

/// Forwarding handle on a normal-scoped component, typed to contract `T`
///
/// Holds no instance. Each call resolves the live instance in the context
/// of the component's scope within the [`ContextSet`] passed by the caller,
/// creating it on first use. Two proxies for the same component are equal.
pub struct ClientProxy<T: ?Sized> {
    container: Weak<ContainerInner>,
    bean: Arc<Bean>,
    _contract: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> ClientProxy<T> {
    pub(crate) fn new(container: Weak<ContainerInner>, bean: Arc<Bean>) -> Self {
        Self {
            container,
            bean,
            _contract: PhantomData,
        }
    }

    /// The live instance in `contexts`, created if absent
    pub fn get(&self, contexts: &ContextSet) -> Result<Arc<T>> {
        let container = self.container()?;
        let instance = container.contextual_instance(&self.bean, contexts, &[])?;
        self.bean.cast::<T>(&instance)
    }

    /// Call `f` on the live instance through the interception chain of `method`
    pub fn invoke<R, F>(&self, contexts: &ContextSet, method: &str, f: F) -> Result<R>
    where
        R: Any + Send,
        F: FnOnce(&T) -> Result<R>,
    {
        self.call(contexts, Invocation::new(method), |target, _| f(target))
    }

    /// Call `body` on the live instance through the interception chain, with arguments
    ///
    /// Interceptors and decorators may rewrite the arguments `body` receives.
    pub fn call<R, F>(&self, contexts: &ContextSet, invocation: Invocation, body: F) -> Result<R>
    where
        R: Any + Send,
        F: FnOnce(&T, &[Parameter]) -> Result<R>,
    {
        let container = self.container()?;
        let instance = container.contextual_instance(&self.bean, contexts, &[])?;
        let target = self.bean.cast::<T>(&instance)?;
        interception::run(
            &container.chains,
            container.registry(),
            &self.bean,
            target.as_ref(),
            invocation,
            body,
        )
    }

    /// Serializable handle for passivation
    pub fn handle(&self) -> ProxyHandle {
        ProxyHandle {
            component: self.bean.id().clone(),
            contract: TypeKey::of::<T>(),
        }
    }

    fn container(&self) -> Result<Arc<ContainerInner>> {
        self.container.upgrade().ok_or_else(|| {
            Error::illegal_state(format!(
                "proxy for {} outlived its container",
                self.bean.id()
            ))
        })
    }
}

impl<T: ?Sized> ClientProxy<T> {
    /// Target component id
    pub fn component(&self) -> &ComponentId {
        self.bean.id()
    }

    /// Target bean
    pub fn bean(&self) -> &Arc<Bean> {
        &self.bean
    }
}

impl<T: ?Sized> Clone for ClientProxy<T> {
    fn clone(&self) -> Self {
        Self {
            container: Weak::clone(&self.container),
            bean: Arc::clone(&self.bean),
            _contract: PhantomData,
        }
    }
}

impl<T: ?Sized> PartialEq for ClientProxy<T> {
    fn eq(&self, other: &Self) -> bool {
        self.bean.id() == other.bean.id()
    }
}

impl<T: ?Sized> Eq for ClientProxy<T> {}

impl<T: ?Sized> Hash for ClientProxy<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bean.id().hash(state);
    }
}

impl<T: ?Sized> fmt::Debug for ClientProxy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientProxy")
            .field("component", self.bean.id())
            .field("contract", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T: ?Sized + Send + Sync + 'static> Serialize for ClientProxy<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.handle().serialize(serializer)
    }
}
