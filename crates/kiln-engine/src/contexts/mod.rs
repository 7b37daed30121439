//! Scopes, contexts and contextual stores
//!
//! | Type | Role |
//! |------|------|
//! | [`ScopeRegistry`] | Known scope definitions, built-in and custom |
//! | [`ContextualStore`] | Live instances of one context, created exactly once |
//! | [`Context`] | One scope's activation state and its attached store |
//! | [`ContextSet`] | The contexts visible to one unit of work |
//! | [`ConversationRegistry`] | Long-running conversation stores by id |
//!
//! Shared scopes (application, singleton) have one context for the whole
//! process. Every other scope gets a fresh, inactive context per
//! [`ContextSet`]; the host activates it at its own boundaries.

mod context;
mod conversation;
mod scopes;
mod set;
mod store;

pub use context::Context;
pub use conversation::ConversationRegistry;
pub use scopes::ScopeRegistry;
pub use set::{ContextSet, ContextSnapshot};
pub use store::{ContextualInstance, ContextualStore};
