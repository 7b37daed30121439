//! Definition normalization and definition-level checks

use crate::bean::Bean;
use crate::contexts::ScopeRegistry;
use crate::metadata::ComponentDefinition;
use crate::resolution::RegistryParts;
use kiln_domain::{DescriptorFactory, Reception, ScopeId};
use std::collections::HashSet;

/// Normalizes definitions into registry parts, numbering them in feed order
pub(crate) struct Normalizer {
    factory: DescriptorFactory,
    default_priority: i32,
    next_index: usize,
}

impl Normalizer {
    pub(crate) fn new(scopes: &ScopeRegistry, default_priority: i32) -> Self {
        Self {
            factory: DescriptorFactory::for_scopes(scopes.definitions()),
            default_priority,
            next_index: 0,
        }
    }

    /// Normalize `definitions` into `parts`, collecting every problem
    pub(crate) fn normalize(
        &mut self,
        definitions: Vec<ComponentDefinition>,
        parts: &mut RegistryParts,
        problems: &mut Vec<String>,
    ) {
        for definition in definitions {
            let index = self.next_index;
            self.next_index += 1;
            match definition {
                ComponentDefinition::Bean(bean) => match self.factory.create(&bean.metadata, index) {
                    Ok(Some(descriptor)) => parts.beans.push(Bean::new(descriptor, bean.behavior)),
                    Ok(None) => {}
                    Err(found) => problems.extend(found),
                },
                ComponentDefinition::Observer(mut observer) => {
                    observer.normalize(index, self.default_priority);
                    parts.observers.push(observer);
                }
                ComponentDefinition::Interceptor(mut interceptor) => {
                    interceptor.set_discovery_index(index);
                    parts.interceptors.push(interceptor);
                }
                ComponentDefinition::Decorator(mut decorator) => {
                    decorator.set_discovery_index(index);
                    parts.decorators.push(decorator);
                }
            }
        }
    }
}

/// Problems that only show once every definition is normalized
pub(crate) fn check_definitions(parts: &RegistryParts) -> Vec<String> {
    let mut problems = Vec::new();

    let mut ids = HashSet::new();
    let component_ids = parts
        .beans
        .iter()
        .map(Bean::id)
        .chain(parts.interceptors.iter().map(|i| i.id()))
        .chain(parts.decorators.iter().map(|d| d.id()));
    for id in component_ids {
        if !ids.insert(id.as_str()) {
            problems.push(format!("{id}: component id is declared more than once"));
        }
    }

    let mut observer_ids = HashSet::new();
    for observer in &parts.observers {
        let descriptor = observer.descriptor();
        if !observer_ids.insert(descriptor.id.as_str()) {
            problems.push(format!("{}: observer id is declared more than once", descriptor.id));
        }
        let Some(owner) = &descriptor.owner else {
            continue;
        };
        match parts.beans.iter().find(|bean| bean.id() == owner) {
            None => problems.push(format!(
                "{}: owning component {owner} is not registered",
                descriptor.id
            )),
            Some(bean) if *bean.scope() == ScopeId::Dependent && descriptor.reception == Reception::IfExists => {
                problems.push(format!(
                    "{}: conditional observer on dependent component {owner}",
                    descriptor.id
                ));
            }
            Some(_) => {}
        }
    }

    for interceptor in &parts.interceptors {
        if interceptor.descriptor().bindings.is_empty() {
            problems.push(format!("{}: interceptor declares no binding", interceptor.id()));
        }
    }

    for decorator in &parts.decorators {
        if decorator.descriptor().decorated_types.is_empty() {
            problems.push(format!("{}: decorator decorates no type", decorator.id()));
        }
    }

    problems
}
