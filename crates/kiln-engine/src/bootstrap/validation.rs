//! Deployment validation
//!
//! Runs once against the built registry. Every problem is collected; the
//! bootstrap fails with all of them rather than the first.

use crate::bean::Bean;
use crate::config::DeploymentConfig;
use crate::contexts::ScopeRegistry;
use crate::resolution::{Registry, Resolution, Resolver, describe_request};
use kiln_domain::{ComponentId, InjectionPoint, ScopeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

/// Checks a built registry for deployment problems
pub struct DeploymentValidator<'a> {
    resolver: Resolver,
    scopes: &'a ScopeRegistry,
    deployment: &'a DeploymentConfig,
}

impl<'a> DeploymentValidator<'a> {
    /// Validator over `registry`
    pub fn new(registry: Arc<Registry>, scopes: &'a ScopeRegistry, deployment: &'a DeploymentConfig) -> Self {
        Self {
            resolver: Resolver::new(registry),
            scopes,
            deployment,
        }
    }

    /// Every deployment problem found
    pub fn validate(&self) -> Vec<String> {
        let mut problems = Vec::new();
        self.check_injection_points(&mut problems);
        self.check_passivation(&mut problems);
        self.check_cycles(&mut problems);
        self.check_names(&mut problems);
        self.check_enablement(&mut problems);
        problems
    }

    fn registry(&self) -> &Registry {
        self.resolver.registry()
    }

    fn enabled_beans(&self) -> impl Iterator<Item = &Arc<Bean>> {
        self.registry()
            .beans()
            .iter()
            .filter(|bean| bean.descriptor().is_enabled())
    }

    fn resolve_point(&self, point: &InjectionPoint) -> Resolution {
        self.resolver.resolve(&point.required_type, &point.qualifiers)
    }

    fn check_injection_points(&self, problems: &mut Vec<String>) {
        for bean in self.enabled_beans() {
            for point in &bean.descriptor().injection_points {
                let request = describe_point(point);
                match self.resolve_point(point) {
                    Resolution::Unsatisfied if !point.optional => {
                        problems.push(format!("{}: unsatisfied dependency {request}", bean.id()));
                    }
                    Resolution::Ambiguous(candidates) => {
                        let ids: Vec<String> = candidates.iter().map(|c| c.id().to_string()).collect();
                        problems.push(format!(
                            "{}: ambiguous dependency {request} matches {}",
                            bean.id(),
                            ids.join(", ")
                        ));
                    }
                    _ => {}
                }
            }
        }
    }

    fn check_passivation(&self, problems: &mut Vec<String>) {
        for bean in self.enabled_beans() {
            if !self.scopes.is_passivating(bean.scope()) {
                continue;
            }
            if !bean.descriptor().passivation_capable {
                problems.push(format!(
                    "{}: scope {} requires a passivation capable component",
                    bean.id(),
                    bean.scope()
                ));
            }
            for point in &bean.descriptor().injection_points {
                if let Resolution::Resolved(target) = self.resolve_point(point) {
                    if *target.scope() == ScopeId::Dependent && !target.descriptor().passivation_capable {
                        problems.push(format!(
                            "{}: dependent {} injected into passivating scope {} is not passivation capable",
                            bean.id(),
                            target.id(),
                            bean.scope()
                        ));
                    }
                }
            }
        }
    }

    // Proxied targets break cycles: an edge only exists to a non-normal scope
    fn unproxied_targets(&self, bean: &Bean) -> Vec<Arc<Bean>> {
        bean.descriptor()
            .injection_points
            .iter()
            .filter_map(|point| match self.resolve_point(point) {
                Resolution::Resolved(target) if !self.scopes.is_normal(target.scope()) => Some(target),
                _ => None,
            })
            .collect()
    }

    fn check_cycles(&self, problems: &mut Vec<String>) {
        let mut marks = HashMap::new();
        let mut path = Vec::new();
        for bean in self.enabled_beans() {
            self.visit(bean, &mut marks, &mut path, problems);
        }
    }

    fn visit(
        &self,
        bean: &Arc<Bean>,
        marks: &mut HashMap<ComponentId, Mark>,
        path: &mut Vec<ComponentId>,
        problems: &mut Vec<String>,
    ) {
        match marks.get(bean.id()) {
            Some(Mark::Done) => return,
            Some(Mark::Visiting) => {
                let start = path.iter().position(|id| id == bean.id()).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(ToString::to_string).collect();
                cycle.push(bean.id().to_string());
                problems.push(format!(
                    "circular dependency between non-proxied components: {}",
                    cycle.join(" -> ")
                ));
                return;
            }
            None => {}
        }
        marks.insert(bean.id().clone(), Mark::Visiting);
        path.push(bean.id().clone());
        for target in self.unproxied_targets(bean) {
            self.visit(&target, marks, path, problems);
        }
        path.pop();
        marks.insert(bean.id().clone(), Mark::Done);
    }

    fn check_names(&self, problems: &mut Vec<String>) {
        let mut names: Vec<&str> = self.registry().names().collect();
        names.sort_unstable();
        for name in names {
            if let Resolution::Ambiguous(candidates) = self.resolver.resolve_named(name) {
                let ids: Vec<String> = candidates.iter().map(|c| c.id().to_string()).collect();
                if self.deployment.strict_validation {
                    problems.push(format!("ambiguous name '{name}' matches {}", ids.join(", ")));
                } else {
                    warn!(name, candidates = %ids.join(", "), "Ambiguous component name");
                }
            }
        }
    }

    fn check_enablement(&self, problems: &mut Vec<String>) {
        let registry = self.registry();
        for id in &self.deployment.enabled_alternatives {
            match registry.bean(&ComponentId::new(id.clone())) {
                Some(bean) if bean.descriptor().alternative => {}
                Some(_) => problems.push(format!("enabled alternative {id} is not an alternative")),
                None => problems.push(format!("enabled alternative {id} is not registered")),
            }
        }
        for id in &self.deployment.enabled_interceptors {
            if !registry.interceptors().iter().any(|i| i.id().as_str() == id) {
                problems.push(format!("enabled interceptor {id} is not registered"));
            }
        }
        for id in &self.deployment.enabled_decorators {
            if !registry.decorators().iter().any(|d| d.id().as_str() == id) {
                problems.push(format!("enabled decorator {id} is not registered"));
            }
        }
    }
}

fn describe_point(point: &InjectionPoint) -> String {
    let request = describe_request(&point.required_type, &point.qualifiers);
    match &point.label {
        Some(label) => format!("{label}: {request}"),
        None => request,
    }
}
