//! Client proxies and injected references
//!
//! Normal-scoped components are never handed out directly. A [`ClientProxy`]
//! holds the component's bean and a weak handle on the container, and
//! looks the live instance up in the caller's [`ContextSet`](crate::contexts::ContextSet)
//! on every call. The proxy, not the instance, is what gets passivated: it
//! serializes to a [`ProxyHandle`] and comes back through
//! [`Container::revive`](crate::container::Container::revive).

mod client;
mod handle;
mod reference;

pub use client::ClientProxy;
pub use handle::ProxyHandle;
pub use reference::Reference;
