use crate::model::InjectionPoint;
use crate::value_objects::{ComponentId, InterceptorBinding, Qualifier, ScopeId, TypeKey};
use serde::{Deserialize, Serialize};

/// One declared annotation of a discovered type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum Annotation {
    /// Scope declaration
    Scope(ScopeId),
    /// Qualifier
    Qualifier(Qualifier),
    /// `@Named`, with the default name when `None`
    Named(Option<String>),
    /// Marks the component as an alternative
    Alternative,
    /// Ordering key; enables alternatives
    Priority(i32),
    /// Overrides another component
    Specializes(ComponentId),
    /// Component-level interceptor binding
    InterceptorBinding(InterceptorBinding),
    /// Interceptor binding on one method
    MethodBinding {
        /// Method name
        method: String,
        /// Binding
        binding: InterceptorBinding,
    },
    /// Instances may be passivated
    PassivationCapable,
    /// Excludes the type from registration
    Vetoed,
    /// Explicit component id
    Id(ComponentId),
}

/// Raw metadata of a discovered type, before normalization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeMetadata {
    /// Class name of the implementation
    pub class_name: String,
    /// Supertype closure as declared by the source
    pub types: Vec<TypeKey>,
    /// Declared annotations, in declaration order
    pub annotations: Vec<Annotation>,
    /// Declared dependencies
    pub injection_points: Vec<InjectionPoint>,
}

impl TypeMetadata {
    /// Metadata with a class name and nothing else
    pub fn new<S: Into<String>>(class_name: S) -> Self {
        Self {
            class_name: class_name.into(),
            types: Vec::new(),
            annotations: Vec::new(),
            injection_points: Vec::new(),
        }
    }

    /// Add a type to the closure
    pub fn with_type(mut self, ty: TypeKey) -> Self {
        if !self.types.contains(&ty) {
            self.types.push(ty);
        }
        self
    }

    /// Add an annotation
    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Add an injection point
    pub fn with_injection_point(mut self, point: InjectionPoint) -> Self {
        self.injection_points.push(point);
        self
    }

    /// Whether the type carries `@Vetoed`
    pub fn is_vetoed(&self) -> bool {
        self.annotations.contains(&Annotation::Vetoed)
    }

    /// Simple name of the class (`acme::engines::TurboEngine` → `TurboEngine`)
    pub fn simple_name(&self) -> &str {
        let name = self.class_name.split('<').next().unwrap_or(&self.class_name);
        name.rsplit("::")
            .next()
            .and_then(|segment| segment.rsplit('.').next())
            .unwrap_or(name)
    }

    /// Default component name: the simple name with its first character lowercased
    pub fn default_name(&self) -> String {
        let simple = self.simple_name();
        let mut chars = simple.chars();
        match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}
