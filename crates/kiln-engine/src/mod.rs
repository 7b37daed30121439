//! # Kiln Engine
//!
//! Resolution and lifecycle engine of the Kiln container. Everything here
//! works on normalized descriptors from `kiln-domain`; how a component was
//! declared is the business of a [`metadata`] source.
//!
//! ## Module Categories
//!
//! ### Resolution & Lifecycle
//! | Module | Description |
//! |--------|-------------|
//! | [`resolution`] | Registry indexes and the typesafe/name-based resolver |
//! | [`contexts`] | Scope registry, contexts, contextual stores, conversations |
//! | [`bean`] | Bean definitions, creational contexts, dependent instances |
//! | [`proxy`] | Client proxies and references handed to callers |
//! | [`instance`] | Dynamic lookup handle |
//!
//! ### Events & Interception
//! | Module | Description |
//! |--------|-------------|
//! | [`events`] | Observers, synchronous and asynchronous dispatch |
//! | [`interception`] | Interceptors, decorators and cached invocation chains |
//!
//! ### Bootstrap & Configuration
//! | Module | Description |
//! |--------|-------------|
//! | [`metadata`] | Linked, registered and declarative metadata sources |
//! | [`bootstrap`] | Extensions, normalization, validation, startup |
//! | [`container`] | The running container |
//! | [`config`] | Figment-based configuration |
//! | [`logging`] | Structured logging with tracing |
//! | [`constants`] | Engine constants |

pub mod bean;
pub mod bootstrap;
pub mod config;
pub mod constants;
pub mod container;
pub mod contexts;
pub mod error_ext;
pub mod events;
pub mod instance;
pub mod interception;
pub mod logging;
pub mod metadata;
pub mod proxy;
pub mod resolution;

// Re-export commonly used types
pub use bean::{Bean, BeanDefinition, CreationalContext};
pub use bootstrap::{Bootstrap, Extension};
pub use config::{ConfigLoader, KilnConfig};
pub use container::Container;
pub use contexts::{ContextSet, ContextSnapshot};
pub use error_ext::ErrorContext;
pub use events::{AsyncDelivery, Event, Observer};
pub use instance::Instance;
pub use interception::{DecoratorDefinition, Invocation, InterceptorDefinition};
pub use metadata::{ComponentDefinition, ComponentEntry, MetadataSource};
pub use proxy::{ClientProxy, ProxyHandle, Reference};
pub use resolution::Resolution;

// Compile-time registration uses this crate's linkme
pub use linkme;
