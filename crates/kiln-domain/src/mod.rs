//! # Kiln Domain
//!
//! The metadata model of the Kiln container: everything the resolution and
//! lifecycle engine knows about a component, independent of where that
//! knowledge came from (compile-time registration, programmatic registration,
//! or a declarative deployment descriptor).
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`value_objects`] | Type keys, qualifiers, interceptor bindings, scopes, component ids |
//! | [`model`] | Descriptors and the raw discovery metadata they are normalized from |
//! | [`events`] | Payloads of the container lifecycle events |
//! | [`error`] | Error taxonomy shared by every layer |
//! | [`constants`] | Built-in qualifier names and default priorities |

pub mod constants;
pub mod error;
pub mod events;
pub mod model;
pub mod value_objects;

pub use error::{Error, Result};
pub use model::{
    Annotation, ComponentDescriptor, DecoratorDescriptor, DescriptorFactory, InjectionPoint,
    InterceptorDescriptor, ObserverDescriptor, ObserverMode, Reception, TypeMetadata,
};
pub use value_objects::{ComponentId, InterceptorBinding, Qualifier, ScopeDefinition, ScopeId, TypeKey};
