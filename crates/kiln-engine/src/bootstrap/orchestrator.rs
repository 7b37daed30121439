use crate::bootstrap::extension::{AfterBeanDiscovery, AfterTypeDiscovery, BeforeDiscovery, Extension};
use crate::bootstrap::normalize::{Normalizer, check_definitions};
use crate::bootstrap::validation::DeploymentValidator;
use crate::config::{KilnConfig, validate_config};
use crate::container::{Container, ContainerInner, ContainerParts};
use crate::contexts::ScopeRegistry;
use crate::events::{Dispatcher, Executor};
use crate::logging::log_problems;
use crate::metadata::{ComponentDefinition, LinkedComponents, MetadataSource, RegisteredComponents};
use crate::resolution::{Registry, RegistryParts};
use kiln_domain::error::{Error, Result};
use kiln_domain::events::ContainerInitialized;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, error, info};

/// Builds and starts a container
///
/// ```ignore
/// let container = Bootstrap::new(ConfigLoader::new().load()?)
///     .linked_components()
///     .register(Bean::builder::<V8>().exposes::<dyn Engine>(|e| e).build_default())
///     .start()?;
/// ```
pub struct Bootstrap {
    config: KilnConfig,
    sources: Vec<Box<dyn MetadataSource>>,
    registered: RegisteredComponents,
    extensions: Vec<Arc<dyn Extension>>,
    runtime: Option<Handle>,
}

impl Bootstrap {
    /// Bootstrap with no metadata source yet
    pub fn new(config: KilnConfig) -> Self {
        Self {
            config,
            sources: Vec::new(),
            registered: RegisteredComponents::new(),
            extensions: Vec::new(),
            runtime: None,
        }
    }

    /// Read components from `source`, after the sources added before it
    pub fn source<S: MetadataSource + 'static>(mut self, source: S) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Read the compile-time registered components
    pub fn linked_components(self) -> Self {
        self.source(LinkedComponents)
    }

    /// Register one component programmatically; read after every source
    pub fn register<D: Into<ComponentDefinition>>(mut self, definition: D) -> Self {
        self.registered.add(definition);
        self
    }

    /// Add an extension; hooks run in registration order
    pub fn extension<E: Extension + 'static>(mut self, extension: E) -> Self {
        self.extensions.push(Arc::new(extension));
        self
    }

    /// Deliver asynchronous observers on a host runtime instead of a dedicated one
    pub fn runtime_handle(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Discover, validate and start
    ///
    /// Fails with [`Error::Definition`] or [`Error::Deployment`] carrying
    /// every problem of the failing phase.
    pub fn start(self) -> Result<Container> {
        let Self {
            config,
            mut sources,
            registered,
            extensions,
            runtime,
        } = self;
        validate_config(&config)?;
        info!(
            sources = sources.len() + 1,
            extensions = extensions.len(),
            "Bootstrapping container"
        );

        let mut scopes = ScopeRegistry::new();
        let mut problems = Vec::new();
        for scope in &config.contexts.custom_scopes {
            if let Err(problem) = scopes.register(scope.definition()) {
                problems.push(problem);
            }
        }

        let mut before = BeforeDiscovery::default();
        for extension in &extensions {
            extension.before_discovery(&mut before)?;
        }
        for scope in before.scopes {
            if let Err(problem) = scopes.register(scope) {
                problems.push(problem);
            }
        }

        sources.push(Box::new(registered));
        let mut discovered = AfterTypeDiscovery {
            definitions: before.definitions,
        };
        for source in &sources {
            let definitions = source.discover()?;
            debug!(source = source.name(), definitions = definitions.len(), "Source discovered");
            discovered.definitions.extend(definitions);
        }
        for extension in &extensions {
            extension.after_type_discovery(&mut discovered)?;
        }

        let mut normalizer = Normalizer::new(&scopes, config.events.default_priority);
        let mut parts = RegistryParts::default();
        normalizer.normalize(discovered.definitions, &mut parts, &mut problems);

        let mut additions = Vec::new();
        for extension in &extensions {
            let mut event = AfterBeanDiscovery::new(&parts.beans, &parts.observers);
            extension.after_bean_discovery(&mut event)?;
            problems.extend(event.problems);
            additions.extend(event.additions);
        }
        normalizer.normalize(additions, &mut parts, &mut problems);
        problems.extend(check_definitions(&parts));
        if !problems.is_empty() {
            log_problems("definition", &problems);
            return Err(Error::definition(problems));
        }

        let (registry, mut problems) = Registry::build(parts, &config.deployment);
        let registry = Arc::new(registry);
        problems.extend(DeploymentValidator::new(Arc::clone(&registry), &scopes, &config.deployment).validate());
        if !problems.is_empty() {
            log_problems("deployment", &problems);
            return Err(Error::deployment(problems));
        }

        let executor = if registry.has_async_observers() {
            Some(match runtime {
                Some(handle) => Executor::external(handle),
                None => Executor::owned(config.events.async_workers)?,
            })
        } else {
            None
        };

        let initialized = ContainerInitialized {
            components: registry.beans().len(),
            observers: registry.observers().len(),
        };
        let container = Container::from_inner(ContainerInner::new(ContainerParts {
            config,
            scopes,
            registry,
            dispatcher: Dispatcher::new(executor),
            extensions,
        }));

        if let Err(err) = after_validation(&container) {
            error!(error = %err, "Deployment vetoed");
            if let Err(shutdown) = container.shutdown() {
                error!(error = %shutdown, "Shutdown after veto failed");
            }
            return Err(err);
        }

        let contexts = container.contexts()?;
        container.fire(&contexts, initialized.clone(), &[])?;
        info!(
            components = initialized.components,
            observers = initialized.observers,
            "Container started"
        );
        Ok(container)
    }
}

fn after_validation(container: &Container) -> Result<()> {
    for extension in container.extensions() {
        extension.after_deployment_validation(container)?;
    }
    Ok(())
}

impl std::fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrap")
            .field("sources", &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("registered", &self.registered.len())
            .field("extensions", &self.extensions.iter().map(|e| e.name()).collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
