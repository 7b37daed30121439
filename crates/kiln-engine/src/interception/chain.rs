use crate::bean::Bean;
use crate::config::DeploymentConfig;
use crate::interception::invocation::Target;
use crate::interception::{
    DecoratorDefinition, InterceptorDefinition, Invocation, InvocationContext, Parameter,
    ReturnValue,
};
use crate::resolution::Registry;
use dashmap::DashMap;
use kiln_domain::constants::CONFIG_ENABLED_INTERCEPTOR_PRIORITY;
use kiln_domain::error::{Error, Result};
use kiln_domain::{ComponentId, Qualifier};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// One link of a chain
#[derive(Clone)]
pub(crate) enum Link {
    Decorator(Arc<DecoratorDefinition>),
    Interceptor(Arc<InterceptorDefinition>),
}

impl Link {
    pub(crate) fn invoke(&self, ctx: &mut InvocationContext<'_>) -> Result<ReturnValue> {
        match self {
            Self::Decorator(definition) => definition.decorator().invoke(ctx),
            Self::Interceptor(definition) => definition.interceptor().around_invoke(ctx),
        }
    }

    fn id(&self) -> &ComponentId {
        match self {
            Self::Decorator(definition) => definition.id(),
            Self::Interceptor(definition) => definition.id(),
        }
    }
}

/// Decorators and interceptors around one method of one component
pub struct InterceptionChain {
    component: ComponentId,
    method: String,
    links: Vec<Link>,
}

impl InterceptionChain {
    /// Intercepted component
    pub fn component(&self) -> &ComponentId {
        &self.component
    }

    /// Intercepted method
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Ids of the links, outermost first
    pub fn link_ids(&self) -> Vec<&ComponentId> {
        self.links.iter().map(Link::id).collect()
    }

    /// Number of links
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether calls go straight to the target
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl fmt::Debug for InterceptionChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptionChain")
            .field("component", &self.component)
            .field("method", &self.method)
            .field("links", &self.link_ids())
            .finish()
    }
}

/// Priority an interceptor or decorator runs at, `None` when it is not enabled
///
/// A declared priority wins; otherwise position in the configured list,
/// after every application priority.
pub fn effective_priority(id: &ComponentId, declared: Option<i32>, enabled: &[String]) -> Option<i32> {
    declared.or_else(|| {
        let position = enabled.iter().position(|entry| entry == id.as_str())?;
        i32::try_from(position)
            .ok()
            .map(|offset| CONFIG_ENABLED_INTERCEPTOR_PRIORITY.saturating_add(offset))
    })
}

/// Chains by (component, method), built on first use
pub struct ChainCache {
    enabled_interceptors: Vec<String>,
    enabled_decorators: Vec<String>,
    chains: DashMap<(ComponentId, String), Arc<InterceptionChain>>,
}

impl ChainCache {
    /// Empty cache for a deployment
    pub fn new(deployment: &DeploymentConfig) -> Self {
        Self {
            enabled_interceptors: deployment.enabled_interceptors.clone(),
            enabled_decorators: deployment.enabled_decorators.clone(),
            chains: DashMap::new(),
        }
    }

    /// Chain around `method` of `bean`
    pub fn chain(&self, registry: &Registry, bean: &Bean, method: &str) -> Arc<InterceptionChain> {
        let key = (bean.id().clone(), method.to_string());
        if let Some(chain) = self.chains.get(&key) {
            return Arc::clone(chain.value());
        }
        let built = Arc::new(self.build(registry, bean, method));
        Arc::clone(self.chains.entry(key).or_insert(built).value())
    }

    /// Number of cached chains
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// Whether no chain was built yet
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    fn build(&self, registry: &Registry, bean: &Bean, method: &str) -> InterceptionChain {
        let descriptor = bean.descriptor();

        let mut decorators: Vec<(i32, usize, Link)> = registry
            .decorators()
            .iter()
            .filter(|definition| {
                let decorated = definition.descriptor();
                decorated.decorated_types.iter().any(|ty| descriptor.has_type(ty))
                    && Qualifier::satisfied_by(
                        &Qualifier::normalize_request(&decorated.delegate_qualifiers),
                        &descriptor.qualifiers,
                    )
                    && definition.decorator().decorates(method)
            })
            .filter_map(|definition| {
                let decorated = definition.descriptor();
                effective_priority(&decorated.id, decorated.priority, &self.enabled_decorators)
                    .map(|priority| {
                        (
                            priority,
                            decorated.discovery_index,
                            Link::Decorator(Arc::clone(definition)),
                        )
                    })
            })
            .collect();
        decorators.sort_by_key(|(priority, index, _)| (*priority, *index));

        let bindings = descriptor.bindings_for(method);
        let mut interceptors: Vec<(i32, usize, Link)> = if bindings.is_empty() {
            Vec::new()
        } else {
            registry
                .interceptors()
                .iter()
                .filter(|definition| definition.descriptor().binds_to(&bindings))
                .filter_map(|definition| {
                    let interceptor = definition.descriptor();
                    effective_priority(&interceptor.id, interceptor.priority, &self.enabled_interceptors)
                        .map(|priority| {
                            (
                                priority,
                                interceptor.discovery_index,
                                Link::Interceptor(Arc::clone(definition)),
                            )
                        })
                })
                .collect()
        };
        interceptors.sort_by_key(|(priority, index, _)| (*priority, *index));

        let links: Vec<Link> = decorators
            .into_iter()
            .chain(interceptors)
            .map(|(_, _, link)| link)
            .collect();
        let chain = InterceptionChain {
            component: bean.id().clone(),
            method: method.to_string(),
            links,
        };
        if !chain.is_empty() {
            debug!(component = %chain.component, method, links = chain.len(), "Interception chain built");
        }
        chain
    }
}

impl fmt::Debug for ChainCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainCache")
            .field("chains", &self.chains.len())
            .finish_non_exhaustive()
    }
}

/// Run `body` on `instance` through the chain of `bean` for the invoked method
pub(crate) fn run<T, R, F>(
    chains: &ChainCache,
    registry: &Registry,
    bean: &Bean,
    instance: &T,
    invocation: Invocation,
    body: F,
) -> Result<R>
where
    T: ?Sized,
    R: Any + Send,
    F: FnOnce(&T, &[Parameter]) -> Result<R>,
{
    let chain = chains.chain(registry, bean, invocation.method());
    if chain.is_empty() {
        return body(instance, invocation.parameters());
    }

    let target: Target<'_> = Box::new(move |parameters: &[Parameter]| {
        body(instance, parameters).map(|value| Box::new(value) as ReturnValue)
    });
    let mut ctx = InvocationContext::new(bean.id(), invocation, &chain.links, target);
    let value = ctx.proceed()?;
    value
        .downcast::<R>()
        .map(|typed| *typed)
        .map_err(|_| Error::type_mismatch(std::any::type_name::<R>(), bean.id()))
}
