//! Normalization of discovery metadata into descriptors
//!
//! Every definition problem found in one piece of metadata is reported, not
//! just the first, so the bootstrap can surface them all at once.

use crate::model::{Annotation, ComponentDescriptor, TypeMetadata};
use crate::value_objects::{ComponentId, Qualifier, ScopeDefinition, ScopeId, TypeKey};
use std::collections::{BTreeMap, BTreeSet};

/// Builds [`ComponentDescriptor`]s from [`TypeMetadata`]
#[derive(Debug, Clone, Default)]
pub struct DescriptorFactory {
    custom_scopes: BTreeSet<String>,
}

impl DescriptorFactory {
    /// Factory that knows the built-in scopes plus the given custom scopes
    pub fn new<I, S>(custom_scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            custom_scopes: custom_scopes.into_iter().map(Into::into).collect(),
        }
    }

    /// Factory for a set of scope definitions
    pub fn for_scopes<'a, I>(scopes: I) -> Self
    where
        I: IntoIterator<Item = &'a ScopeDefinition>,
    {
        Self::new(scopes.into_iter().filter_map(|scope| match &scope.id {
            ScopeId::Custom(name) => Some(name.clone()),
            _ => None,
        }))
    }

    /// Whether a scope id is known to this factory
    pub fn knows_scope(&self, scope: &ScopeId) -> bool {
        match scope {
            ScopeId::Custom(name) => self.custom_scopes.contains(name),
            _ => true,
        }
    }

    /// Normalize one piece of metadata
    ///
    /// Returns `Ok(None)` for vetoed types and `Err` with every definition
    /// problem found otherwise.
    pub fn create(
        &self,
        metadata: &TypeMetadata,
        discovery_index: usize,
    ) -> Result<Option<ComponentDescriptor>, Vec<String>> {
        if metadata.is_vetoed() {
            return Ok(None);
        }

        let mut problems = Vec::new();
        let class = &metadata.class_name;

        if class.trim().is_empty() {
            problems.push("component with an empty class name".to_string());
        }

        if metadata.types.iter().all(TypeKey::is_object) {
            problems.push(format!("{class}: type closure is empty"));
        }

        let mut types = metadata.types.clone();
        if !types.iter().any(TypeKey::is_object) {
            types.push(TypeKey::object());
        }

        let mut scopes = Vec::new();
        let mut qualifiers: Vec<Qualifier> = Vec::new();
        let mut name = None;
        let mut alternative = false;
        let mut priority = None;
        let mut specializes = None;
        let mut interceptor_bindings = Vec::new();
        let mut method_bindings: BTreeMap<String, Vec<_>> = BTreeMap::new();
        let mut passivation_capable = false;
        let mut id = None;

        for annotation in &metadata.annotations {
            match annotation {
                Annotation::Scope(scope) => scopes.push(scope.clone()),
                Annotation::Qualifier(qualifier) => {
                    if qualifier.is_named() {
                        name = qualifier.name_value().map(str::to_string);
                    }
                    qualifiers.push(qualifier.clone());
                }
                Annotation::Named(value) => {
                    let resolved = value.clone().unwrap_or_else(|| metadata.default_name());
                    if resolved.is_empty() {
                        problems.push(format!("{class}: @Named resolves to an empty name"));
                    }
                    qualifiers.push(Qualifier::named(resolved.clone()));
                    name = Some(resolved);
                }
                Annotation::Alternative => alternative = true,
                Annotation::Priority(value) => {
                    if priority.replace(*value).is_some() {
                        problems.push(format!("{class}: more than one priority declared"));
                    }
                }
                Annotation::Specializes(target) => {
                    if specializes.replace(target.clone()).is_some() {
                        problems.push(format!("{class}: specializes more than one component"));
                    }
                }
                Annotation::InterceptorBinding(binding) => interceptor_bindings.push(binding.clone()),
                Annotation::MethodBinding { method, binding } => method_bindings
                    .entry(method.clone())
                    .or_default()
                    .push(binding.clone()),
                Annotation::PassivationCapable => passivation_capable = true,
                Annotation::Vetoed => {}
                Annotation::Id(value) => id = Some(value.clone()),
            }
        }

        if scopes.len() > 1 {
            let names: Vec<&str> = scopes.iter().map(ScopeId::as_str).collect();
            problems.push(format!(
                "{class}: declares more than one scope ({})",
                names.join(", ")
            ));
        }
        let scope = scopes.into_iter().next().unwrap_or(ScopeId::Dependent);
        if !self.knows_scope(&scope) {
            problems.push(format!("{class}: unknown scope '{scope}'"));
        }

        if qualifiers.iter().all(|q| q.is_named() || q.is_any()) {
            qualifiers.push(Qualifier::default_marker());
        }
        if !qualifiers.iter().any(Qualifier::is_any) {
            qualifiers.push(Qualifier::any());
        }
        qualifiers.sort();
        qualifiers.dedup();

        for point in &metadata.injection_points {
            if point.required_type.is_object() && point.qualifiers.is_empty() {
                problems.push(format!(
                    "{class}: injection point '{point}' requests the universal type without a qualifier"
                ));
            }
        }

        if !problems.is_empty() {
            return Err(problems);
        }

        Ok(Some(ComponentDescriptor {
            id: id.unwrap_or_else(|| ComponentId::new(class.clone())),
            class_name: class.clone(),
            types,
            qualifiers,
            scope,
            name,
            alternative,
            priority,
            enabled: !alternative,
            specializes,
            injection_points: metadata.injection_points.clone(),
            interceptor_bindings,
            method_bindings,
            passivation_capable,
            discovery_index,
        }))
    }
}
