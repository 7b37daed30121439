//! Contextual store
//!
//! Creation happens exactly once per (store, component): each component gets
//! its own slot, and the slot's `OnceCell` runs the producer for one caller
//! while concurrent callers for the same component block on it. Different
//! components never contend beyond the map shard lookup.

use crate::bean::{AnyInstance, Bean, Dependents};
use dashmap::DashMap;
use kiln_domain::ComponentId;
use kiln_domain::error::{Error, Result};
use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, ThreadId};
use tracing::debug;

/// A live instance with everything needed to destroy it
pub struct ContextualInstance {
    bean: Arc<Bean>,
    instance: AnyInstance,
    dependents: Mutex<Dependents>,
    sequence: u64,
}

impl ContextualInstance {
    /// Bean the instance belongs to
    pub fn bean(&self) -> &Arc<Bean> {
        &self.bean
    }

    /// The live instance
    pub fn instance(&self) -> &AnyInstance {
        &self.instance
    }

    /// Creation order within the store
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    fn destroy(&self) {
        self.bean.destroy_instance(&self.instance);
        std::mem::take(&mut *self.dependents.lock()).destroy();
    }
}

#[derive(Default)]
struct SlotState {
    creator: Option<ThreadId>,
    closed: bool,
    disposed: bool,
}

/// One component's cell plus its lifecycle flags
///
/// `closed` is set when the slot leaves the store. Closing and publishing a
/// fresh instance both check the flags under `state`, so an instance that
/// lands in a closed slot is destroyed exactly once by whichever side sees
/// it last.
#[derive(Default)]
struct Slot {
    cell: OnceCell<ContextualInstance>,
    state: Mutex<SlotState>,
}

impl Slot {
    /// Close the slot, destroying its instance if one was published
    fn destroy(&self) -> bool {
        let entry = {
            let mut state = self.state.lock();
            state.closed = true;
            match self.cell.get() {
                Some(entry) if !state.disposed => {
                    state.disposed = true;
                    entry
                }
                _ => return false,
            }
        };
        entry.destroy();
        true
    }

    /// Whether a published instance may be handed out
    ///
    /// A closed slot destroys the instance if nobody has yet.
    fn admit(&self, entry: &ContextualInstance) -> bool {
        let dispose = {
            let mut state = self.state.lock();
            if !state.closed {
                return true;
            }
            !std::mem::replace(&mut state.disposed, true)
        };
        if dispose {
            entry.destroy();
        }
        false
    }
}

/// Clears the creating thread when creation ends, panics included
struct CreatorGuard<'a>(&'a Mutex<SlotState>);

impl Drop for CreatorGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().creator = None;
    }
}

/// Live instances of one context
#[derive(Default)]
pub struct ContextualStore {
    slots: DashMap<ComponentId, Arc<Slot>>,
    sequence: AtomicU64,
}

impl ContextualStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store behind an `Arc`, ready to attach to a context
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// The live instance of `bean`, creating it with `create` if absent
    ///
    /// `create` runs at most once per component even under concurrent calls.
    /// When it fails or panics nothing is recorded and a later call may retry.
    /// A call made by the creating thread while `create` is still running is
    /// a circular creation and fails instead of deadlocking. An instance whose
    /// slot was destroyed while `create` ran is destroyed in turn, and the
    /// call fails with a context-not-active error.
    pub fn get_or_create<F>(&self, bean: &Arc<Bean>, create: F) -> Result<AnyInstance>
    where
        F: FnOnce() -> Result<(AnyInstance, Dependents)>,
    {
        let slot = self.slot(bean.id());
        if let Some(entry) = slot.cell.get() {
            return admitted(&slot, entry, bean);
        }

        let current = thread::current().id();
        if slot.state.lock().creator == Some(current) {
            return Err(Error::creation(
                bean.id(),
                "circular creation: the component is already being created by this thread",
            ));
        }

        let entry = slot.cell.get_or_try_init(|| {
            slot.state.lock().creator = Some(current);
            let guard = CreatorGuard(&slot.state);
            let created = create();
            drop(guard);
            let (instance, dependents) = created?;
            Ok::<_, Error>(ContextualInstance {
                bean: Arc::clone(bean),
                instance,
                dependents: Mutex::new(dependents),
                sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
            })
        })?;
        admitted(&slot, entry, bean)
    }

    /// The live instance of a component, without creating it
    pub fn get(&self, id: &ComponentId) -> Option<AnyInstance> {
        let slot = self.slots.get(id).map(|slot| Arc::clone(slot.value()))?;
        if slot.state.lock().closed {
            return None;
        }
        slot.cell.get().map(|entry| Arc::clone(&entry.instance))
    }

    /// Whether a live instance exists for a component
    pub fn contains(&self, id: &ComponentId) -> bool {
        self.get(id).is_some()
    }

    /// Ids of components with a live instance
    pub fn ids(&self) -> Vec<ComponentId> {
        self.slots
            .iter()
            .filter(|slot| slot.value().cell.get().is_some())
            .map(|slot| slot.key().clone())
            .collect()
    }

    /// Number of live instances
    pub fn len(&self) -> usize {
        self.slots
            .iter()
            .filter(|slot| slot.value().cell.get().is_some())
            .count()
    }

    /// Whether the store holds no live instance
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Destroy the instance of one component
    ///
    /// Returns whether an instance was destroyed.
    pub fn destroy(&self, id: &ComponentId) -> bool {
        self.slots
            .remove(id)
            .is_some_and(|(_, slot)| slot.destroy())
    }

    /// Destroy every instance, most recently created first, and empty the store
    ///
    /// Returns the number of instances destroyed.
    pub fn destroy_all(&self) -> usize {
        let ids: Vec<ComponentId> = self.slots.iter().map(|slot| slot.key().clone()).collect();
        let mut removed: Vec<Arc<Slot>> = ids
            .iter()
            .filter_map(|id| self.slots.remove(id).map(|(_, slot)| slot))
            .collect();
        removed.sort_by_key(|slot| {
            std::cmp::Reverse(slot.cell.get().map_or(0, ContextualInstance::sequence))
        });

        let destroyed = removed.iter().filter(|slot| slot.destroy()).count();
        if destroyed > 0 {
            debug!(destroyed, "Destroyed contextual instances");
        }
        destroyed
    }

    fn slot(&self, id: &ComponentId) -> Arc<Slot> {
        // Clone out of the shard so the guard is released before creation runs
        let entry = self.slots.entry(id.clone()).or_default();
        Arc::clone(entry.value())
    }
}

fn admitted(slot: &Slot, entry: &ContextualInstance, bean: &Bean) -> Result<AnyInstance> {
    if slot.admit(entry) {
        Ok(Arc::clone(&entry.instance))
    } else {
        debug!(component = %bean.id(), "Instance created after its context ended");
        Err(Error::context_not_active(bean.scope()))
    }
}

impl std::fmt::Debug for ContextualStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextualStore")
            .field("instances", &self.ids())
            .finish()
    }
}
