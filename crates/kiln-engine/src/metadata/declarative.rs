//! Declarative deployment descriptors
//!
//! A TOML file assigns deployment metadata to code-provided factories:
//!
//! ```toml
//! [[component]]
//! class = "TurboEngine"
//! scope = "application"
//! qualifiers = [{ kind = "Turbo" }]
//! alternative = true
//! priority = 10
//!
//! [[component.injects]]
//! type = "dyn acme::Fuel"
//! optional = true
//! ```
//!
//! `class` selects a factory from the [`FactoryCatalog`]; everything else
//! replaces the annotations the factory was built with. The factory keeps
//! its type closure, views, producer and lifecycle callbacks.

use crate::bean::BeanDefinition;
use crate::error_ext::ErrorContext;
use crate::metadata::{ComponentDefinition, MetadataSource};
use kiln_domain::error::{Error, Result};
use kiln_domain::{
    Annotation, ComponentId, InjectionPoint, InterceptorBinding, Qualifier, ScopeId, TypeMetadata,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Parsed deployment descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeploymentDescriptor {
    /// Declared components, in file order
    #[serde(default, rename = "component")]
    pub components: Vec<DeclaredComponent>,
}

impl DeploymentDescriptor {
    /// Parse descriptor text
    pub fn parse(text: &str) -> Result<Self> {
        toml::from_str(text).config_context("Invalid deployment descriptor")
    }
}

/// One `[[component]]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeclaredComponent {
    /// Factory name in the catalog; also the component's class name
    pub class: String,
    /// Explicit component id
    #[serde(default)]
    pub id: Option<String>,
    /// Scope name
    #[serde(default)]
    pub scope: Option<ScopeId>,
    /// Qualifiers
    #[serde(default)]
    pub qualifiers: Vec<Qualifier>,
    /// Name for name-based lookup
    #[serde(default)]
    pub name: Option<String>,
    /// Use the default name derived from the class
    #[serde(default)]
    pub named: bool,
    /// Mark as an alternative
    #[serde(default)]
    pub alternative: bool,
    /// Ordering key; enables an alternative
    #[serde(default)]
    pub priority: Option<i32>,
    /// Id of the component this one specializes
    #[serde(default)]
    pub specializes: Option<String>,
    /// Instances may be passivated
    #[serde(default)]
    pub passivation_capable: bool,
    /// Exclude from registration
    #[serde(default)]
    pub vetoed: bool,
    /// Component-level interceptor bindings
    #[serde(default)]
    pub bindings: Vec<InterceptorBinding>,
    /// Declared dependencies, added to the factory's own
    #[serde(default)]
    pub injects: Vec<InjectionPoint>,
}

impl DeclaredComponent {
    fn metadata(&self, factory: &BeanDefinition) -> TypeMetadata {
        let mut metadata = TypeMetadata::new(self.class.clone());
        metadata.types = factory.metadata.types.clone();
        metadata.injection_points = factory.metadata.injection_points.clone();
        metadata.injection_points.extend(self.injects.iter().cloned());

        let mut annotations = Vec::new();
        if let Some(id) = &self.id {
            annotations.push(Annotation::Id(ComponentId::new(id.clone())));
        }
        if let Some(scope) = &self.scope {
            annotations.push(Annotation::Scope(scope.clone()));
        }
        annotations.extend(self.qualifiers.iter().cloned().map(Annotation::Qualifier));
        if self.name.is_some() || self.named {
            annotations.push(Annotation::Named(self.name.clone()));
        }
        if self.alternative {
            annotations.push(Annotation::Alternative);
        }
        if let Some(priority) = self.priority {
            annotations.push(Annotation::Priority(priority));
        }
        if let Some(target) = &self.specializes {
            annotations.push(Annotation::Specializes(ComponentId::new(target.clone())));
        }
        if self.passivation_capable {
            annotations.push(Annotation::PassivationCapable);
        }
        if self.vetoed {
            annotations.push(Annotation::Vetoed);
        }
        annotations.extend(self.bindings.iter().cloned().map(Annotation::InterceptorBinding));
        metadata.annotations = annotations;
        metadata
    }
}

/// Factories addressable by class name from a deployment descriptor
#[derive(Debug, Clone, Default)]
pub struct FactoryCatalog {
    factories: BTreeMap<String, BeanDefinition>,
}

impl FactoryCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `class`
    pub fn register<S: Into<String>>(mut self, class: S, factory: BeanDefinition) -> Self {
        self.factories.insert(class.into(), factory);
        self
    }

    /// Factory registered under `class`
    pub fn get(&self, class: &str) -> Option<&BeanDefinition> {
        self.factories.get(class)
    }

    /// Registered class names
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }
}

enum Origin {
    File(PathBuf),
    Text(String),
}

/// Source reading a TOML deployment descriptor
pub struct DeclarativeSource {
    origin: Origin,
    catalog: FactoryCatalog,
}

impl DeclarativeSource {
    /// Descriptor read from `path` at discovery time
    pub fn from_path<P: AsRef<Path>>(path: P, catalog: FactoryCatalog) -> Self {
        Self {
            origin: Origin::File(path.as_ref().to_path_buf()),
            catalog,
        }
    }

    /// Descriptor given as text
    pub fn from_toml<S: Into<String>>(text: S, catalog: FactoryCatalog) -> Self {
        Self {
            origin: Origin::Text(text.into()),
            catalog,
        }
    }

    fn descriptor(&self) -> Result<DeploymentDescriptor> {
        match &self.origin {
            Origin::File(path) => {
                let text = std::fs::read_to_string(path)
                    .io_context(format!("Failed to read deployment descriptor {}", path.display()))?;
                DeploymentDescriptor::parse(&text)
            }
            Origin::Text(text) => DeploymentDescriptor::parse(text),
        }
    }
}

impl MetadataSource for DeclarativeSource {
    fn name(&self) -> &str {
        "declarative"
    }

    fn discover(&self) -> Result<Vec<ComponentDefinition>> {
        let descriptor = self.descriptor()?;
        let mut definitions = Vec::with_capacity(descriptor.components.len());
        let mut problems = Vec::new();
        for component in &descriptor.components {
            match self.catalog.get(&component.class) {
                Some(factory) => definitions.push(ComponentDefinition::Bean(
                    factory.with_metadata(component.metadata(factory)),
                )),
                None => problems.push(format!(
                    "{}: no factory registered for this class",
                    component.class
                )),
            }
        }
        if !problems.is_empty() {
            return Err(Error::definition(problems));
        }
        debug!(components = definitions.len(), "Deployment descriptor read");
        Ok(definitions)
    }
}

impl std::fmt::Debug for DeclarativeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let origin = match &self.origin {
            Origin::File(path) => path.display().to_string(),
            Origin::Text(_) => "<inline>".to_string(),
        };
        f.debug_struct("DeclarativeSource")
            .field("origin", &origin)
            .field("catalog", &self.catalog.classes().collect::<Vec<_>>())
            .finish()
    }
}
