use crate::container::ContainerInner;
use crate::contexts::ContextSet;
use crate::events::{AsyncDelivery, Executor, Observer, ObserverContext, ObserverOutcome};
use crate::resolution::Registry;
use dashmap::DashMap;
use kiln_domain::error::{Error, Result};
use kiln_domain::{Qualifier, Reception, ScopeId, TypeKey};
use parking_lot::Mutex;
use std::any::Any;
use std::sync::{Arc, Weak};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

type Payload = Arc<dyn Any + Send + Sync>;
type MatchKey = (Vec<TypeKey>, Vec<Qualifier>);

/// Routes fired events to observers
pub(crate) struct Dispatcher {
    executor: Mutex<Option<Executor>>,
    matches: DashMap<MatchKey, Arc<[Arc<Observer>]>>,
}

impl Dispatcher {
    pub(crate) fn new(executor: Option<Executor>) -> Self {
        Self {
            executor: Mutex::new(executor),
            matches: DashMap::new(),
        }
    }

    /// Stop the worker pool; later asynchronous deliveries fail
    pub(crate) fn shutdown(&self) {
        if let Some(mut executor) = self.executor.lock().take() {
            executor.shutdown();
        }
    }

    /// Notify every matching observer of `event`
    ///
    /// Synchronous observers run first, in order, on this thread. The first
    /// failure of a non-tolerant one aborts dispatch and is returned.
    /// Asynchronous observers are then submitted to the worker pool.
    pub(crate) fn fire(
        &self,
        container: &Arc<ContainerInner>,
        contexts: &ContextSet,
        event: Payload,
        types: Vec<TypeKey>,
        qualifiers: &[Qualifier],
    ) -> Result<AsyncDelivery> {
        let observers = self.matching(container.registry(), types, qualifiers);
        if observers.is_empty() {
            return Ok(AsyncDelivery::empty());
        }
        debug!(observers = observers.len(), "Dispatching event");

        for observer in observers.iter().filter(|o| !o.descriptor().is_async()) {
            match notify(container, contexts, observer, event.as_ref(), qualifiers) {
                Ok(_) => {}
                Err(err) if observer.descriptor().tolerant => {
                    warn!(observer = observer.id(), error = %err, "Tolerant observer failed");
                }
                Err(err) => return Err(Error::observer_failed(observer.id(), err)),
            }
        }

        let asynchronous: Vec<&Arc<Observer>> = observers
            .iter()
            .filter(|o| o.descriptor().is_async())
            .collect();
        if asynchronous.is_empty() {
            return Ok(AsyncDelivery::empty());
        }

        let executor = self.executor.lock();
        let executor = executor
            .as_ref()
            .ok_or_else(|| Error::illegal_state("the asynchronous observer pool is not running"))?;
        let token = CancellationToken::new();
        let mut tasks = Vec::with_capacity(asynchronous.len());
        for observer in asynchronous {
            let id = observer.id().to_string();
            let observer = Arc::clone(observer);
            let container = Arc::downgrade(container);
            let event = Arc::clone(&event);
            let qualifiers = qualifiers.to_vec();
            let cancelled = token.clone();
            let task = executor
                .spawn(move || deliver(&container, &observer, event.as_ref(), &qualifiers, &cancelled))
                .ok_or_else(|| Error::illegal_state("the asynchronous observer pool has shut down"))?;
            tasks.push((id, task));
        }
        Ok(AsyncDelivery::new(tasks, token))
    }

    fn matching(&self, registry: &Registry, types: Vec<TypeKey>, qualifiers: &[Qualifier]) -> Arc<[Arc<Observer>]> {
        let key = (event_types(types), event_qualifiers(qualifiers));
        if let Some(hit) = self.matches.get(&key) {
            return Arc::clone(hit.value());
        }
        let matched: Arc<[Arc<Observer>]> = registry
            .observers()
            .iter()
            .filter(|observer| {
                let descriptor = observer.descriptor();
                key.0.contains(&descriptor.observed_type)
                    && Qualifier::satisfied_by(&descriptor.qualifiers, &key.1)
            })
            .cloned()
            .collect();
        self.matches.insert(key, Arc::clone(&matched));
        matched
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("pool", &self.executor.lock().is_some())
            .field("cached", &self.matches.len())
            .finish()
    }
}

/// Type closure of a fired event: its declared types plus the universal type
fn event_types(mut types: Vec<TypeKey>) -> Vec<TypeKey> {
    types.push(TypeKey::object());
    types.sort();
    types.dedup();
    types
}

/// Qualifiers an event carries: the fired ones, `@Default` when none is explicit, and `@Any`
fn event_qualifiers(qualifiers: &[Qualifier]) -> Vec<Qualifier> {
    let mut carried = qualifiers.to_vec();
    if carried.iter().all(|q| q.is_named() || q.is_any()) {
        carried.push(Qualifier::default_marker());
    }
    carried.push(Qualifier::any());
    carried.sort();
    carried.dedup();
    carried
}

/// Notify one observer, resolving or creating its owning instance first
fn notify(
    container: &Arc<ContainerInner>,
    contexts: &ContextSet,
    observer: &Observer,
    event: &(dyn Any + Send + Sync),
    qualifiers: &[Qualifier],
) -> Result<ObserverOutcome> {
    let descriptor = observer.descriptor();
    let Some(owner_id) = &descriptor.owner else {
        observer.notify(&ObserverContext {
            event,
            qualifiers,
            contexts,
            container,
            owner: None,
        })?;
        return Ok(ObserverOutcome::Delivered);
    };
    let bean = container
        .registry()
        .bean(owner_id)
        .cloned()
        .ok_or_else(|| Error::illegal_state(format!("observer owner {owner_id} is not registered")))?;

    if *bean.scope() == ScopeId::Dependent {
        let dependent = container.create_dependent(&bean, contexts, &[])?;
        let result = observer.notify(&ObserverContext {
            event,
            qualifiers,
            contexts,
            container,
            owner: Some((&bean, dependent.instance())),
        });
        dependent.destroy();
        result?;
        return Ok(ObserverOutcome::Delivered);
    }

    let instance = if descriptor.reception == Reception::IfExists {
        let store = match contexts.store(bean.scope()) {
            Ok(store) => store,
            Err(err) if err.is_context_not_active() => return Ok(ObserverOutcome::Skipped),
            Err(err) => return Err(err),
        };
        match store.get(bean.id()) {
            Some(instance) => instance,
            None => return Ok(ObserverOutcome::Skipped),
        }
    } else {
        container.contextual_instance(&bean, contexts, &[])?
    };
    observer.notify(&ObserverContext {
        event,
        qualifiers,
        contexts,
        container,
        owner: Some((&bean, &instance)),
    })?;
    Ok(ObserverOutcome::Delivered)
}

/// Body of one asynchronous observer task
///
/// Runs under a fresh context set with its own request context, destroyed
/// when the observer returns.
fn deliver(
    container: &Weak<ContainerInner>,
    observer: &Observer,
    event: &(dyn Any + Send + Sync),
    qualifiers: &[Qualifier],
    cancelled: &CancellationToken,
) -> ObserverOutcome {
    if cancelled.is_cancelled() {
        return ObserverOutcome::Cancelled;
    }
    let Some(container) = container.upgrade() else {
        return ObserverOutcome::Cancelled;
    };
    let contexts = match container.contexts() {
        Ok(contexts) => contexts,
        Err(err) => return ObserverOutcome::Failed(err),
    };

    let outcome = match contexts.begin(&ScopeId::Request) {
        Ok(_) => notify(&container, &contexts, observer, event, qualifiers)
            .unwrap_or_else(|err| ObserverOutcome::Failed(Error::observer_failed(observer.id(), err))),
        Err(err) => ObserverOutcome::Failed(err),
    };
    if let Err(err) = contexts.invalidate(&ScopeId::Request) {
        warn!(observer = observer.id(), error = %err, "Failed to end the observer request context");
    }
    contexts.deactivate_all();

    if let ObserverOutcome::Failed(err) = &outcome {
        warn!(observer = observer.id(), error = %err, "Asynchronous observer failed");
    }
    outcome
}
