//! Typed events
//!
//! An event is any `'static` value implementing [`Event`]. Firing it through
//! [`Container::fire`](crate::container::Container::fire) notifies every
//! [`Observer`] whose observed type is in the event's type closure and whose
//! qualifiers the fired qualifiers satisfy, lowest priority first.
//!
//! Synchronous observers run on the firing thread and fail fast unless
//! tolerant. Asynchronous observers run on the worker pool; the returned
//! [`AsyncDelivery`] aggregates their outcomes and can cancel the ones that
//! have not started yet.

mod delivery;
mod dispatcher;
mod executor;
mod observer;

pub use delivery::{AsyncDelivery, DeliveryReport, ObserverOutcome};
pub use observer::{Observer, ObserverBuilder, ObserverContext};

pub(crate) use dispatcher::Dispatcher;
pub(crate) use executor::Executor;

use kiln_domain::TypeKey;
use kiln_domain::events::{ContainerInitialized, ContainerShutdown};
use std::any::Any;

/// A value that can be fired to observers
///
/// The type closure defaults to the event's own type. Override
/// [`event_types`](Event::event_types) to let observers of broader,
/// externally named types see the event too; the universal type is always
/// added by the dispatcher.
pub trait Event: Any + Send + Sync {
    /// Types observers may register for to receive this event
    fn event_types(&self) -> Vec<TypeKey> {
        vec![TypeKey::of::<Self>()]
    }
}

impl Event for ContainerInitialized {}

impl Event for ContainerShutdown {}
