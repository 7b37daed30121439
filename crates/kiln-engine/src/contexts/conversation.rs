//! Long-running conversations
//!
//! A conversation outlives the units of work that touch it. Its store is
//! kept here by id and attached to a [`ContextSet`] whenever the host
//! resumes it. Expiry is the host's decision: it calls
//! [`ConversationRegistry::sweep_expired`] with whatever timeout it enforces.

use crate::contexts::{ContextSet, ContextualStore};
use dashmap::DashMap;
use kiln_domain::ScopeId;
use kiln_domain::error::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

struct Conversation {
    store: Arc<ContextualStore>,
    last_access: Mutex<Instant>,
}

impl Conversation {
    fn touch(&self) {
        *self.last_access.lock() = Instant::now();
    }

    fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(*self.last_access.lock())
    }
}

/// Conversation stores by id
#[derive(Default)]
pub struct ConversationRegistry {
    conversations: DashMap<String, Conversation>,
}

impl ConversationRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a conversation and activate it in `contexts`
    pub fn begin(&self, contexts: &ContextSet) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let store = ContextualStore::new_shared();
        contexts.activate(&ScopeId::Conversation, Arc::clone(&store))?;
        self.conversations.insert(
            id.clone(),
            Conversation {
                store,
                last_access: Mutex::new(Instant::now()),
            },
        );
        debug!(conversation = %id, "Conversation started");
        Ok(id)
    }

    /// Activate an existing conversation in `contexts`
    pub fn resume(&self, contexts: &ContextSet, id: &str) -> Result<()> {
        let conversation = self
            .conversations
            .get(id)
            .ok_or_else(|| Error::illegal_state(format!("no conversation with id '{id}'")))?;
        conversation.touch();
        contexts.activate(&ScopeId::Conversation, Arc::clone(&conversation.store))
    }

    /// End a conversation and destroy its instances
    ///
    /// If the conversation is the one active in `contexts` it is deactivated first.
    pub fn end(&self, contexts: &ContextSet, id: &str) -> Result<usize> {
        let (_, conversation) = self
            .conversations
            .remove(id)
            .ok_or_else(|| Error::illegal_state(format!("no conversation with id '{id}'")))?;
        let context = contexts.context(&ScopeId::Conversation)?;
        if context
            .try_store()
            .is_some_and(|active| Arc::ptr_eq(&active, &conversation.store))
        {
            context.deactivate();
        }
        let destroyed = conversation.store.destroy_all();
        debug!(conversation = %id, destroyed, "Conversation ended");
        Ok(destroyed)
    }

    /// Destroy every conversation idle for longer than `timeout`
    ///
    /// Returns the number of conversations swept.
    pub fn sweep_expired(&self, timeout: Duration) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = self
            .conversations
            .iter()
            .filter(|entry| entry.value().idle_for(now) > timeout)
            .map(|entry| entry.key().clone())
            .collect();

        let swept = expired
            .iter()
            .filter_map(|id| self.conversations.remove(id))
            .map(|(_, conversation)| conversation.store.destroy_all())
            .count();
        if swept > 0 {
            info!(swept, "Expired conversations destroyed");
        }
        swept
    }

    /// Ids of live conversations
    pub fn ids(&self) -> Vec<String> {
        self.conversations
            .iter()
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Whether a conversation exists
    pub fn contains(&self, id: &str) -> bool {
        self.conversations.contains_key(id)
    }

    /// Number of live conversations
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    /// Whether no conversation is live
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Destroy every conversation
    pub(crate) fn destroy_all(&self) -> usize {
        let ids = self.ids();
        ids.iter()
            .filter_map(|id| self.conversations.remove(id))
            .map(|(_, conversation)| conversation.store.destroy_all())
            .sum()
    }
}

impl std::fmt::Debug for ConversationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationRegistry")
            .field("conversations", &self.ids())
            .finish()
    }
}
