//! Descriptors and discovery metadata
//!
//! Raw [`TypeMetadata`] arrives from a metadata source; [`DescriptorFactory`]
//! normalizes it into an immutable [`ComponentDescriptor`]. The engine only
//! ever reads descriptors, never raw annotations.

mod descriptor;
mod injection_point;
mod interception;
mod metadata;
mod normalize;
mod observer;

pub use descriptor::ComponentDescriptor;
pub use injection_point::InjectionPoint;
pub use interception::{DecoratorDescriptor, InterceptorDescriptor};
pub use metadata::{Annotation, TypeMetadata};
pub use normalize::DescriptorFactory;
pub use observer::{ObserverDescriptor, ObserverMode, Reception};
