//! Value objects of the metadata model

mod component_id;
mod qualifier;
mod scope;
mod type_key;

pub use component_id::ComponentId;
pub use qualifier::{InterceptorBinding, Qualifier};
pub use scope::{ScopeDefinition, ScopeId};
pub use type_key::TypeKey;
