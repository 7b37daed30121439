use crate::metadata::{ComponentDefinition, MetadataSource};
use kiln_domain::error::Result;

/// Components registered programmatically, in registration order
#[derive(Debug, Clone, Default)]
pub struct RegisteredComponents {
    definitions: Vec<ComponentDefinition>,
}

impl RegisteredComponents {
    /// Empty source
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component
    pub fn add(&mut self, definition: impl Into<ComponentDefinition>) {
        self.definitions.push(definition.into());
    }

    /// Register a component, builder style
    pub fn with(mut self, definition: impl Into<ComponentDefinition>) -> Self {
        self.add(definition);
        self
    }

    /// Number of registered components
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl MetadataSource for RegisteredComponents {
    fn name(&self) -> &str {
        "registered"
    }

    fn discover(&self) -> Result<Vec<ComponentDefinition>> {
        Ok(self.definitions.clone())
    }
}
