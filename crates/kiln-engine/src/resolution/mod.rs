//! Typesafe resolution
//!
//! The [`Registry`] is built once per deployment and read-only afterwards.
//! The [`Resolver`] answers `(type, qualifiers)` and name lookups against it
//! and caches every answer.

mod registry;
mod resolver;

pub use registry::{Registry, RegistryParts};
pub use resolver::{Resolution, Resolver, describe_request};
