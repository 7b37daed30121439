//! Metadata sources
//!
//! The engine never inspects how a component was declared. Each
//! [`MetadataSource`] turns its own kind of declaration into
//! [`ComponentDefinition`]s, and the bootstrap normalizes them all the same
//! way.
//!
//! | Source | Declarations |
//! |--------|--------------|
//! | [`LinkedComponents`] | `#[linkme::distributed_slice(COMPONENTS)]` entries compiled into the binary |
//! | [`RegisteredComponents`] | Definitions added programmatically |
//! | [`DeclarativeSource`] | A TOML deployment descriptor binding factories from a [`FactoryCatalog`] |

mod declarative;
mod linked;
mod registered;

pub use declarative::{DeclarativeSource, DeclaredComponent, DeploymentDescriptor, FactoryCatalog};
pub use linked::{COMPONENTS, ComponentEntry, LinkedComponents};
pub use registered::RegisteredComponents;

use crate::bean::BeanDefinition;
use crate::events::Observer;
use crate::interception::{DecoratorDefinition, InterceptorDefinition};
use kiln_domain::error::Result;

/// One declared component, before normalization
#[derive(Debug, Clone)]
pub enum ComponentDefinition {
    /// Managed bean
    Bean(BeanDefinition),
    /// Observer method, static or owned by a bean
    Observer(Observer),
    /// Around-invoke interceptor
    Interceptor(InterceptorDefinition),
    /// Decorator
    Decorator(DecoratorDefinition),
}

impl ComponentDefinition {
    /// Identity used in diagnostics
    pub fn label(&self) -> String {
        match self {
            Self::Bean(definition) => definition.metadata.class_name.clone(),
            Self::Observer(observer) => observer.id().to_string(),
            Self::Interceptor(interceptor) => interceptor.id().to_string(),
            Self::Decorator(decorator) => decorator.id().to_string(),
        }
    }
}

impl From<BeanDefinition> for ComponentDefinition {
    fn from(definition: BeanDefinition) -> Self {
        Self::Bean(definition)
    }
}

impl From<Observer> for ComponentDefinition {
    fn from(observer: Observer) -> Self {
        Self::Observer(observer)
    }
}

impl From<InterceptorDefinition> for ComponentDefinition {
    fn from(interceptor: InterceptorDefinition) -> Self {
        Self::Interceptor(interceptor)
    }
}

impl From<DecoratorDefinition> for ComponentDefinition {
    fn from(decorator: DecoratorDefinition) -> Self {
        Self::Decorator(decorator)
    }
}

/// A strategy for discovering components
pub trait MetadataSource: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Every component this source declares, in a stable order
    fn discover(&self) -> Result<Vec<ComponentDefinition>>;
}
