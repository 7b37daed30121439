use crate::bean::Bean;
use crate::config::DeploymentConfig;
use crate::events::Observer;
use crate::interception::{DecoratorDefinition, InterceptorDefinition};
use kiln_domain::{ComponentId, Qualifier, TypeKey};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// Normalized components of a deployment, before the registry is built
#[derive(Default)]
pub struct RegistryParts {
    /// Beans, in discovery order
    pub beans: Vec<Bean>,
    /// Observers, in discovery order
    pub observers: Vec<Observer>,
    /// Interceptors, in discovery order
    pub interceptors: Vec<InterceptorDefinition>,
    /// Decorators, in discovery order
    pub decorators: Vec<DecoratorDefinition>,
}

/// Every registered component of a deployment, indexed for resolution
pub struct Registry {
    beans: Vec<Arc<Bean>>,
    by_id: HashMap<ComponentId, Arc<Bean>>,
    by_type: HashMap<TypeKey, Vec<Arc<Bean>>>,
    by_name: HashMap<String, Vec<Arc<Bean>>>,
    ancestors: HashMap<ComponentId, Vec<ComponentId>>,
    observers: Vec<Arc<Observer>>,
    interceptors: Vec<Arc<InterceptorDefinition>>,
    decorators: Vec<Arc<DecoratorDefinition>>,
}

impl Registry {
    /// Build the registry
    ///
    /// Applies alternative enablement and specialization. Returns the
    /// registry together with every deployment problem found on the way.
    pub fn build(parts: RegistryParts, deployment: &DeploymentConfig) -> (Self, Vec<String>) {
        let RegistryParts {
            mut beans,
            mut observers,
            interceptors,
            decorators,
        } = parts;
        let mut problems = Vec::new();

        let enabled: HashSet<&str> = deployment
            .enabled_alternatives
            .iter()
            .map(String::as_str)
            .collect();
        for bean in &mut beans {
            let descriptor = bean.descriptor_mut();
            if descriptor.alternative {
                descriptor.enabled =
                    descriptor.priority.is_some() || enabled.contains(descriptor.id.as_str());
            }
        }

        let ancestors = specialization_ancestors(&beans, &mut problems);
        inherit_from_ancestors(&mut beans, &ancestors, &mut problems);

        let beans: Vec<Arc<Bean>> = beans.into_iter().map(Arc::new).collect();
        let mut by_id = HashMap::new();
        let mut by_type: HashMap<TypeKey, Vec<Arc<Bean>>> = HashMap::new();
        let mut by_name: HashMap<String, Vec<Arc<Bean>>> = HashMap::new();
        for bean in &beans {
            by_id.insert(bean.id().clone(), Arc::clone(bean));
            for ty in &bean.descriptor().types {
                by_type.entry(ty.clone()).or_default().push(Arc::clone(bean));
            }
            if let Some(name) = &bean.descriptor().name {
                by_name.entry(name.clone()).or_default().push(Arc::clone(bean));
            }
        }

        observers.sort_by_key(|observer| observer.descriptor().ordering_key());

        debug!(
            beans = beans.len(),
            observers = observers.len(),
            interceptors = interceptors.len(),
            decorators = decorators.len(),
            "Registry built"
        );

        let registry = Self {
            beans,
            by_id,
            by_type,
            by_name,
            ancestors,
            observers: observers.into_iter().map(Arc::new).collect(),
            interceptors: interceptors.into_iter().map(Arc::new).collect(),
            decorators: decorators.into_iter().map(Arc::new).collect(),
        };
        (registry, problems)
    }

    /// Every bean, in discovery order
    pub fn beans(&self) -> &[Arc<Bean>] {
        &self.beans
    }

    /// Bean by id
    pub fn bean(&self, id: &ComponentId) -> Option<&Arc<Bean>> {
        self.by_id.get(id)
    }

    /// Beans whose type closure contains `ty`
    pub fn beans_of_type(&self, ty: &TypeKey) -> &[Arc<Bean>] {
        self.by_type.get(ty).map_or(&[], Vec::as_slice)
    }

    /// Beans registered under `name`
    pub fn beans_named(&self, name: &str) -> &[Arc<Bean>] {
        self.by_name.get(name).map_or(&[], Vec::as_slice)
    }

    /// Every registered name
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// Whether `candidate` specializes `ancestor`, directly or transitively
    pub fn is_specialized_by(&self, ancestor: &ComponentId, candidate: &ComponentId) -> bool {
        self.ancestors
            .get(candidate)
            .is_some_and(|chain| chain.contains(ancestor))
    }

    /// Observers, by priority then discovery order
    pub fn observers(&self) -> &[Arc<Observer>] {
        &self.observers
    }

    /// Whether any observer is asynchronous
    pub fn has_async_observers(&self) -> bool {
        self.observers
            .iter()
            .any(|observer| observer.descriptor().is_async())
    }

    /// Interceptors, in discovery order
    pub fn interceptors(&self) -> &[Arc<InterceptorDefinition>] {
        &self.interceptors
    }

    /// Decorators, in discovery order
    pub fn decorators(&self) -> &[Arc<DecoratorDefinition>] {
        &self.decorators
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("beans", &self.beans.len())
            .field("observers", &self.observers.len())
            .field("interceptors", &self.interceptors.len())
            .field("decorators", &self.decorators.len())
            .finish()
    }
}

/// Transitive specialization chains, nearest ancestor first
fn specialization_ancestors(
    beans: &[Bean],
    problems: &mut Vec<String>,
) -> HashMap<ComponentId, Vec<ComponentId>> {
    let index: HashMap<&ComponentId, &Bean> = beans.iter().map(|bean| (bean.id(), bean)).collect();

    let mut specializers: HashMap<&ComponentId, Vec<&ComponentId>> = HashMap::new();
    for bean in beans {
        let Some(target) = &bean.descriptor().specializes else {
            continue;
        };
        let Some(specialized) = index.get(target) else {
            problems.push(format!(
                "{} specializes {target}, which is not a registered component",
                bean.id()
            ));
            continue;
        };
        specializers.entry(target).or_default().push(bean.id());

        let missing: Vec<String> = specialized
            .descriptor()
            .types
            .iter()
            .filter(|ty| !ty.is_object() && !bean.descriptor().has_type(ty))
            .map(ToString::to_string)
            .collect();
        if !missing.is_empty() {
            problems.push(format!(
                "{} specializes {target} but does not provide {}",
                bean.id(),
                missing.join(", ")
            ));
        }
    }
    let mut contested: Vec<_> = specializers
        .into_iter()
        .filter(|(_, ids)| ids.len() > 1)
        .collect();
    contested.sort_by(|a, b| a.0.cmp(b.0));
    for (target, ids) in contested {
        let names: Vec<&str> = ids.iter().map(|id| id.as_str()).collect();
        problems.push(format!(
            "{target} is specialized by more than one component: {}",
            names.join(", ")
        ));
    }

    let mut ancestors = HashMap::new();
    for bean in beans {
        let mut chain: Vec<ComponentId> = Vec::new();
        let mut next = bean.descriptor().specializes.as_ref();
        while let Some(target) = next {
            if target == bean.id() || chain.contains(target) {
                problems.push(format!("{} is part of a specialization cycle", bean.id()));
                break;
            }
            chain.push(target.clone());
            next = index
                .get(target)
                .and_then(|specialized| specialized.descriptor().specializes.as_ref());
        }
        if !chain.is_empty() {
            ancestors.insert(bean.id().clone(), chain);
        }
    }
    ancestors
}

/// Specializing components inherit the qualifiers and the name of their ancestors
fn inherit_from_ancestors(
    beans: &mut [Bean],
    ancestors: &HashMap<ComponentId, Vec<ComponentId>>,
    problems: &mut Vec<String>,
) {
    let declared: HashMap<ComponentId, (Vec<Qualifier>, Option<String>)> = beans
        .iter()
        .map(|bean| {
            let descriptor = bean.descriptor();
            (
                descriptor.id.clone(),
                (descriptor.qualifiers.clone(), descriptor.name.clone()),
            )
        })
        .collect();

    for bean in beans.iter_mut() {
        let Some(chain) = ancestors.get(bean.id()) else {
            continue;
        };
        let inherited_name = chain
            .iter()
            .find_map(|ancestor| declared.get(ancestor).and_then(|(_, name)| name.clone()));
        let descriptor = bean.descriptor_mut();

        for ancestor in chain {
            if let Some((qualifiers, _)) = declared.get(ancestor) {
                descriptor.qualifiers.extend(qualifiers.iter().cloned());
            }
        }
        descriptor.qualifiers.sort();
        descriptor.qualifiers.dedup();

        if let Some(name) = inherited_name {
            match &descriptor.name {
                Some(own) if *own != name => problems.push(format!(
                    "{} declares the name '{own}' but specializes a component named '{name}'",
                    descriptor.id
                )),
                _ => {
                    descriptor.qualifiers.push(Qualifier::named(name.clone()));
                    descriptor.qualifiers.sort();
                    descriptor.qualifiers.dedup();
                    descriptor.name = Some(name);
                }
            }
        }
    }
}
