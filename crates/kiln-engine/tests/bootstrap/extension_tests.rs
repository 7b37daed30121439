//! Extension hooks during bootstrap and shutdown

use crate::test_utils::{Engine, StandardEngine, Tally, bootstrap};
use kiln_domain::error::{Error, Result};
use kiln_domain::{InjectionPoint, ScopeDefinition, ScopeId};
use kiln_engine::bootstrap::{AfterBeanDiscovery, AfterTypeDiscovery, BeforeDiscovery};
use kiln_engine::config::KilnConfig;
use kiln_engine::{Bean, Container, Extension};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Board;

struct Legacy;

struct Tenancy {
    shutdowns: Arc<Tally>,
}

impl Extension for Tenancy {
    fn name(&self) -> &str {
        "tenancy"
    }

    fn before_discovery(&self, event: &mut BeforeDiscovery) -> Result<()> {
        event.add_scope(ScopeDefinition::custom("tenant", true, false, false));
        Ok(())
    }

    fn after_type_discovery(&self, event: &mut AfterTypeDiscovery) -> Result<()> {
        assert_eq!(event.veto_label("Legacy"), 1);
        Ok(())
    }

    fn after_bean_discovery(&self, event: &mut AfterBeanDiscovery<'_>) -> Result<()> {
        if !event.beans().iter().any(|bean| bean.exposes(&kiln_domain::TypeKey::of::<dyn Engine>())) {
            event.add(
                Bean::builder::<StandardEngine>()
                    .id("synthetic-engine")
                    .exposes::<dyn Engine>(|engine| engine)
                    .build_default(),
            );
        }
        Ok(())
    }

    fn before_shutdown(&self, container: &Container) -> Result<()> {
        assert!(container.is_running());
        self.shutdowns.bump();
        Ok(())
    }
}

fn tenant() -> ScopeId {
    ScopeId::Custom("tenant".to_string())
}

#[test]
fn test_extension_shapes_the_deployment() {
    let shutdowns = Arc::new(Tally::default());
    let container = bootstrap(
        KilnConfig::default(),
        vec![
            Bean::builder::<Legacy>()
                .class_name("Legacy")
                .injects(InjectionPoint::of::<String>())
                .build(|_| Ok(Legacy))
                .into(),
            Bean::builder::<Board>()
                .id("board")
                .scope(tenant())
                .build_default()
                .into(),
        ],
    )
    .extension(Tenancy {
        shutdowns: Arc::clone(&shutdowns),
    })
    .start()
    .expect("vetoed legacy component no longer fails validation");
    let contexts = container.contexts().expect("contexts");

    let engine = container.resolve::<dyn Engine>(&contexts, &[]).expect("synthetic");
    assert_eq!(engine.component().as_str(), "synthetic-engine");

    let board = container.proxy::<Board>(&[]).expect("tenant scope is normal");
    assert!(board.get(&contexts).expect_err("no tenant yet").is_context_not_active());
    contexts.begin(&tenant()).expect("begin tenant");
    assert!(board.get(&contexts).is_ok());

    container.shutdown().expect("shutdown");
    assert_eq!(shutdowns.get(), 1);
}

struct Auditor;

impl Extension for Auditor {
    fn name(&self) -> &str {
        "auditor"
    }

    fn after_bean_discovery(&self, event: &mut AfterBeanDiscovery<'_>) -> Result<()> {
        for bean in event.beans() {
            if bean.descriptor().name.is_none() {
                let problem = format!("{} must be named", bean.id());
                event.add_definition_problem(problem);
            }
        }
        Ok(())
    }
}

#[test]
fn test_extension_reports_definition_problems() {
    let err = bootstrap(
        KilnConfig::default(),
        vec![Bean::builder::<Board>().id("board").build_default().into()],
    )
    .extension(Auditor)
    .start()
    .expect_err("unnamed component");

    assert!(matches!(err, Error::Definition { .. }));
    assert_eq!(err.problems(), ["board must be named".to_string()]);
}

struct Veto;

impl Extension for Veto {
    fn name(&self) -> &str {
        "veto"
    }

    fn after_deployment_validation(&self, container: &Container) -> Result<()> {
        let contexts = container.contexts()?;
        container.proxy::<Board>(&[])?.get(&contexts)?;
        Err(Error::illegal_state("maintenance window"))
    }
}

#[test]
fn test_extension_vetoes_the_deployment() {
    let destroyed = Arc::new(Tally::default());
    let counter = Arc::clone(&destroyed);
    let err = bootstrap(
        KilnConfig::default(),
        vec![
            Bean::builder::<Board>()
                .id("board")
                .scope(ScopeId::Application)
                .pre_destroy(move |_| {
                    counter.bump();
                    Ok(())
                })
                .build_default()
                .into(),
        ],
    )
    .extension(Veto)
    .start()
    .expect_err("vetoed");

    assert!(err.to_string().contains("maintenance window"));
    assert_eq!(destroyed.get(), 1);
}

struct Failing;

impl Extension for Failing {
    fn name(&self) -> &str {
        "failing"
    }

    fn before_discovery(&self, _event: &mut BeforeDiscovery) -> Result<()> {
        Err(Error::configuration("missing license"))
    }
}

#[test]
fn test_failing_hook_aborts_the_bootstrap() {
    let err = bootstrap(KilnConfig::default(), Vec::new())
        .extension(Failing)
        .start()
        .expect_err("hook failed");

    assert!(matches!(err, Error::Configuration { .. }));
}
