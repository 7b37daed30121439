use crate::bean::Bean;
use crate::container::Container;
use crate::events::Observer;
use crate::metadata::ComponentDefinition;
use kiln_domain::ScopeDefinition;
use kiln_domain::error::Result;

/// Bootstrap hook points
///
/// Each hook runs once, synchronously, in registration order. Returning an
/// error from any hook aborts the bootstrap with that error.
pub trait Extension: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Register scopes and components before any source is read
    fn before_discovery(&self, _event: &mut BeforeDiscovery) -> Result<()> {
        Ok(())
    }

    /// Inspect, veto or add discovered definitions
    fn after_type_discovery(&self, _event: &mut AfterTypeDiscovery) -> Result<()> {
        Ok(())
    }

    /// Add synthetic components or report definition problems
    fn after_bean_discovery(&self, _event: &mut AfterBeanDiscovery<'_>) -> Result<()> {
        Ok(())
    }

    /// Veto the deployment by returning an error
    fn after_deployment_validation(&self, _container: &Container) -> Result<()> {
        Ok(())
    }

    /// Runs during shutdown, before any context is destroyed
    fn before_shutdown(&self, _container: &Container) -> Result<()> {
        Ok(())
    }
}

/// Payload of [`Extension::before_discovery`]
#[derive(Debug, Default)]
pub struct BeforeDiscovery {
    pub(crate) scopes: Vec<ScopeDefinition>,
    pub(crate) definitions: Vec<ComponentDefinition>,
}

impl BeforeDiscovery {
    /// Register a custom scope
    pub fn add_scope(&mut self, scope: ScopeDefinition) {
        self.scopes.push(scope);
    }

    /// Add a component ahead of every metadata source
    pub fn add<D: Into<ComponentDefinition>>(&mut self, definition: D) {
        self.definitions.push(definition.into());
    }
}

/// Payload of [`Extension::after_type_discovery`]
#[derive(Debug, Default)]
pub struct AfterTypeDiscovery {
    pub(crate) definitions: Vec<ComponentDefinition>,
}

impl AfterTypeDiscovery {
    /// Everything discovered so far, in discovery order
    pub fn definitions(&self) -> &[ComponentDefinition] {
        &self.definitions
    }

    /// Remove every definition matching `predicate`; returns how many were removed
    pub fn veto<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&ComponentDefinition) -> bool,
    {
        let before = self.definitions.len();
        self.definitions.retain(|definition| !predicate(definition));
        before - self.definitions.len()
    }

    /// Remove the definitions labelled `label`
    pub fn veto_label(&mut self, label: &str) -> usize {
        self.veto(|definition| definition.label() == label)
    }

    /// Append a definition
    pub fn add<D: Into<ComponentDefinition>>(&mut self, definition: D) {
        self.definitions.push(definition.into());
    }
}

/// Payload of [`Extension::after_bean_discovery`]
#[derive(Debug)]
pub struct AfterBeanDiscovery<'a> {
    pub(crate) beans: &'a [Bean],
    pub(crate) observers: &'a [Observer],
    pub(crate) additions: Vec<ComponentDefinition>,
    pub(crate) problems: Vec<String>,
}

impl<'a> AfterBeanDiscovery<'a> {
    pub(crate) fn new(beans: &'a [Bean], observers: &'a [Observer]) -> Self {
        Self {
            beans,
            observers,
            additions: Vec::new(),
            problems: Vec::new(),
        }
    }

    /// Normalized beans
    pub fn beans(&self) -> &'a [Bean] {
        self.beans
    }

    /// Normalized observers
    pub fn observers(&self) -> &'a [Observer] {
        self.observers
    }

    /// Add a synthetic component
    pub fn add<D: Into<ComponentDefinition>>(&mut self, definition: D) {
        self.additions.push(definition.into());
    }

    /// Report a definition problem; the bootstrap fails after this phase
    pub fn add_definition_problem<S: Into<String>>(&mut self, problem: S) {
        self.problems.push(problem.into());
    }
}
