//! Definition and deployment validation

use crate::test_utils::{Engine, StandardEngine, TurboEngine, start_err, start_with, turbo};
use kiln_domain::error::Error;
use kiln_domain::{InjectionPoint, Qualifier, ScopeId};
use kiln_engine::config::{ConfigBuilder, CustomScopeConfig, KilnConfig};
use kiln_engine::metadata::ComponentDefinition;
use kiln_engine::{Bean, InterceptorDefinition};

struct Garage;
struct Front;
struct Back;

fn engines() -> Vec<ComponentDefinition> {
    vec![
        Bean::builder::<StandardEngine>()
            .id("standard")
            .exposes::<dyn Engine>(|engine| engine)
            .build_default()
            .into(),
        Bean::builder::<TurboEngine>()
            .id("turbo")
            .exposes::<dyn Engine>(|engine| engine)
            .qualifier(turbo())
            .build_default()
            .into(),
    ]
}

#[test]
fn test_deployment_problems_are_aggregated() {
    let mut definitions = engines();
    definitions.push(
        Bean::builder::<Garage>()
            .id("garage")
            .injects(InjectionPoint::of::<dyn Engine>().qualified(Qualifier::any()).labeled("engine"))
            .injects(InjectionPoint::of::<String>().labeled("owner"))
            .injects(InjectionPoint::of::<u64>().optional())
            .build(|_| Ok(Garage))
            .into(),
    );

    let err = start_err(KilnConfig::default(), definitions);

    assert!(matches!(err, Error::Deployment { .. }));
    let problems = err.problems();
    assert_eq!(problems.len(), 2, "{problems:?}");
    assert!(problems.iter().any(|p| p.contains("ambiguous") && p.contains("standard") && p.contains("turbo")));
    assert!(problems.iter().any(|p| p.contains("unsatisfied") && p.contains("owner")));
}

#[test]
fn test_satisfied_injection_points_deploy() {
    let mut definitions = engines();
    definitions.push(
        Bean::builder::<Garage>()
            .id("garage")
            .injects(InjectionPoint::of::<dyn Engine>())
            .injects(InjectionPoint::of::<dyn Engine>().qualified(turbo()))
            .build(|_| Ok(Garage))
            .into(),
    );

    let container = start_with(KilnConfig::default(), definitions);
    assert!(container.is_running());
}

#[test]
fn test_definition_problems_are_aggregated() {
    let err = start_err(
        KilnConfig::default(),
        vec![
            Bean::builder::<StandardEngine>().id("dup").build_default().into(),
            Bean::builder::<TurboEngine>().id("dup").build_default().into(),
            InterceptorDefinition::from_fn("unbound", |ctx| ctx.proceed()).into(),
        ],
    );

    assert!(matches!(err, Error::Definition { .. }));
    let problems = err.problems();
    assert_eq!(problems.len(), 2, "{problems:?}");
    assert!(problems.iter().any(|p| p.contains("dup")));
    assert!(problems.iter().any(|p| p.contains("unbound")));
}

#[test]
fn test_unknown_scope_is_a_definition_error() {
    let err = start_err(
        KilnConfig::default(),
        vec![
            Bean::builder::<Garage>()
                .id("garage")
                .scope(ScopeId::Custom("tenant".to_string()))
                .build(|_| Ok(Garage))
                .into(),
        ],
    );

    assert!(matches!(err, Error::Definition { .. }));
    assert!(err.to_string().contains("tenant"));
}

#[test]
fn test_cycle_between_unproxied_components_fails_deployment() {
    let err = start_err(
        KilnConfig::default(),
        vec![
            Bean::builder::<Front>()
                .id("front")
                .injects(InjectionPoint::of::<Back>())
                .build(|_| Ok(Front))
                .into(),
            Bean::builder::<Back>()
                .id("back")
                .injects(InjectionPoint::of::<Front>())
                .build(|_| Ok(Back))
                .into(),
        ],
    );

    assert!(matches!(err, Error::Deployment { .. }));
    assert!(err.problems().iter().any(|p| p.contains("circular")));
}

#[test]
fn test_normal_scope_breaks_the_cycle() {
    let container = start_with(
        KilnConfig::default(),
        vec![
            Bean::builder::<Front>()
                .id("front")
                .injects(InjectionPoint::of::<Back>())
                .build(|_| Ok(Front))
                .into(),
            Bean::builder::<Back>()
                .id("back")
                .scope(ScopeId::Application)
                .injects(InjectionPoint::of::<Front>())
                .build(|_| Ok(Back))
                .into(),
        ],
    );

    assert!(container.is_running());
}

#[test]
fn test_passivating_scope_requires_passivation_capable_components() {
    let err = start_err(
        KilnConfig::default(),
        vec![
            Bean::builder::<Garage>()
                .id("garage")
                .scope(ScopeId::Session)
                .build(|_| Ok(Garage))
                .into(),
        ],
    );

    assert!(matches!(err, Error::Deployment { .. }));
    assert!(err.to_string().contains("passivation"));
}

#[test]
fn test_passivating_component_rejects_unpassivatable_dependents() {
    let mut definitions = engines();
    definitions.push(
        Bean::builder::<Garage>()
            .id("garage")
            .scope(ScopeId::Session)
            .passivation_capable()
            .injects(InjectionPoint::of::<dyn Engine>())
            .build(|_| Ok(Garage))
            .into(),
    );

    let err = start_err(KilnConfig::default(), definitions);
    assert!(err.problems().iter().any(|p| p.contains("standard")));
}

#[test]
fn test_ambiguous_names_follow_strictness() {
    let named = || {
        vec![
            Bean::builder::<StandardEngine>()
                .id("standard")
                .exposes::<dyn Engine>(|engine| engine)
                .named("engine")
                .build_default()
                .into(),
            Bean::builder::<TurboEngine>()
                .id("turbo")
                .exposes::<dyn Engine>(|engine| engine)
                .qualifier(turbo())
                .named("engine")
                .build_default()
                .into(),
        ]
    };

    let err = start_err(KilnConfig::default(), named());
    assert!(err.problems().iter().any(|p| p.contains("ambiguous name 'engine'")));

    let container = start_with(ConfigBuilder::new().lenient_names().build(), named());
    let contexts = container.contexts().expect("contexts");
    let lookup = container.resolve_named::<dyn Engine>(&contexts, "engine");
    assert!(lookup.expect_err("still ambiguous at lookup").is_ambiguous());
}

#[test]
fn test_configured_custom_scope_is_usable() {
    #[derive(Default)]
    struct Ledger;

    let config = ConfigBuilder::new()
        .with_custom_scope(CustomScopeConfig {
            name: "batch".to_string(),
            normal: true,
            shared: true,
            passivating: false,
        })
        .build();
    let container = start_with(
        config,
        vec![
            Bean::builder::<Ledger>()
                .id("ledger")
                .scope(ScopeId::Custom("batch".to_string()))
                .build_default()
                .into(),
        ],
    );
    let contexts = container.contexts().expect("contexts");

    let ledger = container.proxy::<Ledger>(&[]).expect("normal custom scope");
    assert!(contexts.is_active(&ScopeId::Custom("batch".to_string())));
    assert!(ledger.get(&contexts).is_ok());
}

#[test]
fn test_invalid_configuration_is_rejected_before_discovery() {
    let config = ConfigBuilder::new().with_async_workers(0).build();

    let err = start_err(config, engines());
    assert!(matches!(err, Error::Configuration { .. }));
}
