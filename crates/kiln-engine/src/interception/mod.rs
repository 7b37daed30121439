//! Interception and decoration
//!
//! A call routed through a [`Reference`](crate::proxy::Reference) or a
//! [`ClientProxy`](crate::proxy::ClientProxy) walks an [`InterceptionChain`]:
//! decorators first (outermost first), then around-invoke interceptors in
//! priority order, then the target method. Each link sees the call as an
//! [`InvocationContext`] and decides whether to [`proceed`](InvocationContext::proceed).
//!
//! Chains are built once per (component, method) and cached in [`ChainCache`].

mod chain;
mod definition;
mod invocation;

pub use chain::{ChainCache, InterceptionChain, effective_priority};
pub use definition::{Decorator, DecoratorDefinition, Interceptor, InterceptorDefinition};
pub use invocation::{Invocation, InvocationContext, Parameter, ReturnValue};

pub(crate) use chain::run;
