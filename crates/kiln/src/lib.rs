//! # Kiln
//!
//! A contextual dependency-injection container: components declared with a
//! type closure, qualifiers and a scope are resolved typesafely, created
//! lazily in the context of their scope, reached through client proxies,
//! notified of typed events and wrapped in interceptor and decorator chains.
//!
//! ## Example
//!
//! ```ignore
//! use kiln::prelude::*;
//!
//! trait Engine: Send + Sync {
//!     fn start(&self) -> String;
//! }
//!
//! #[derive(Default)]
//! struct V8;
//!
//! impl Engine for V8 {
//!     fn start(&self) -> String {
//!         "vroom".to_string()
//!     }
//! }
//!
//! let container = Bootstrap::new(KilnConfig::default())
//!     .register(
//!         Bean::builder::<V8>()
//!             .scope(ScopeId::Application)
//!             .exposes::<dyn Engine>(|engine| engine)
//!             .build_default(),
//!     )
//!     .start()?;
//!
//! let contexts = container.contexts()?;
//! let engine = container.resolve::<dyn Engine>(&contexts, &[])?;
//! assert_eq!(engine.get(&contexts)?.start(), "vroom");
//! container.shutdown()?;
//! ```
//!
//! ## Architecture
//!
//! - `domain` - Metadata model: type keys, qualifiers, scopes, descriptors, errors
//! - `engine` - Resolver, contexts, proxies, events, interception, bootstrap

/// Domain layer - metadata model and error taxonomy
///
/// Re-exports from the domain crate for convenience
pub mod domain {
    pub use kiln_domain::*;
}

/// Engine layer - resolution, lifecycle, events and bootstrap
///
/// Re-exports from the engine crate for convenience
pub mod engine {
    pub use kiln_engine::*;
}

// Re-export commonly used domain types at the crate root
pub use domain::{
    ComponentId, Error, InjectionPoint, InterceptorBinding, Qualifier, Result, ScopeDefinition,
    ScopeId, TypeKey,
};

// Re-export the engine entry points
pub use engine::{Bootstrap, Container, ContextSet, KilnConfig, linkme};

/// Everything needed to declare components and run a container
pub mod prelude {
    pub use kiln_domain::events::{ContainerInitialized, ContainerShutdown};
    pub use kiln_domain::{
        ComponentId, Error, InjectionPoint, InterceptorBinding, Qualifier, Reception, Result,
        ScopeId, TypeKey,
    };
    pub use kiln_engine::bean::{Bean, BeanDefinition, CreationalContext};
    pub use kiln_engine::bootstrap::{
        AfterBeanDiscovery, AfterTypeDiscovery, BeforeDiscovery, Bootstrap, Extension,
    };
    pub use kiln_engine::config::{ConfigLoader, KilnConfig};
    pub use kiln_engine::container::Container;
    pub use kiln_engine::contexts::{ContextSet, ContextSnapshot};
    pub use kiln_engine::events::{AsyncDelivery, DeliveryReport, Event, Observer, ObserverContext};
    pub use kiln_engine::instance::Instance;
    pub use kiln_engine::interception::{
        DecoratorDefinition, Interceptor, InterceptorDefinition, Invocation, InvocationContext,
    };
    pub use kiln_engine::metadata::{COMPONENTS, ComponentDefinition, ComponentEntry};
    pub use kiln_engine::proxy::{ClientProxy, ProxyHandle, Reference};
}
