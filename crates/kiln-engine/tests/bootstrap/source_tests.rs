//! Metadata sources: linked entries and deployment descriptors

use crate::test_utils::{Engine, TurboEngine, turbo};
use kiln_domain::error::Error;
use kiln_domain::{ScopeId, TypeKey};
use kiln_engine::config::KilnConfig;
use kiln_engine::metadata::{
    COMPONENTS, ComponentDefinition, ComponentEntry, DeclarativeSource, FactoryCatalog,
    LinkedComponents, MetadataSource,
};
use kiln_engine::{Bean, Bootstrap};

#[derive(Default)]
struct Thermostat;

#[linkme::distributed_slice(COMPONENTS)]
static LINKED_THERMOSTAT: ComponentEntry = ComponentEntry {
    name: "source-tests-thermostat",
    description: "Thermostat registered at compile time",
    definition: thermostat,
};

fn thermostat() -> ComponentDefinition {
    Bean::builder::<Thermostat>()
        .id("linked-thermostat")
        .scope(ScopeId::Application)
        .build_default()
        .into()
}

fn catalog() -> FactoryCatalog {
    FactoryCatalog::new().register(
        "TurboEngine",
        Bean::builder::<TurboEngine>()
            .exposes::<dyn Engine>(|engine| engine)
            .build_default(),
    )
}

const DESCRIPTOR: &str = r#"
[[component]]
class = "TurboEngine"
id = "declared-turbo"
scope = "application"
qualifiers = [{ kind = "Turbo" }]
named = true
"#;

#[test]
fn test_linked_entries_are_discovered() {
    assert!(
        LinkedComponents::entries()
            .iter()
            .any(|(name, _)| *name == "source-tests-thermostat")
    );

    let container = Bootstrap::new(KilnConfig::default())
        .linked_components()
        .start()
        .expect("start");
    let contexts = container.contexts().expect("contexts");

    let thermostat = container.proxy::<Thermostat>(&[]).expect("linked component");
    assert_eq!(thermostat.component().as_str(), "linked-thermostat");
    assert!(thermostat.get(&contexts).is_ok());
}

#[test]
fn test_descriptor_assigns_metadata_to_factories() {
    let container = Bootstrap::new(KilnConfig::default())
        .source(DeclarativeSource::from_toml(DESCRIPTOR, catalog()))
        .start()
        .expect("start");
    let contexts = container.contexts().expect("contexts");

    assert!(container.resolution(&TypeKey::of::<dyn Engine>(), &[]).is_unsatisfied());
    let engine = container.proxy::<dyn Engine>(&[turbo()]).expect("declared qualifier");
    assert_eq!(engine.component().as_str(), "declared-turbo");
    assert_eq!(*engine.bean().scope(), ScopeId::Application);
    assert_eq!(engine.get(&contexts).expect("instance").model(), "turbo");

    let named = container
        .resolve_named::<dyn Engine>(&contexts, "turboEngine")
        .expect("default name from the class");
    assert_eq!(named.component().as_str(), "declared-turbo");
}

#[test]
fn test_descriptor_read_from_a_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("kiln-components.toml");
    std::fs::write(&path, DESCRIPTOR).expect("write descriptor");

    let definitions = DeclarativeSource::from_path(&path, catalog())
        .discover()
        .expect("discover");
    assert_eq!(definitions.len(), 1);
    assert_eq!(definitions[0].label(), "TurboEngine");
}

#[test]
fn test_unknown_class_is_a_definition_error() {
    let source = DeclarativeSource::from_toml(
        r#"
        [[component]]
        class = "DieselEngine"
        "#,
        catalog(),
    );

    let err = source.discover().expect_err("no factory");
    assert!(matches!(err, Error::Definition { .. }));
    assert!(err.to_string().contains("DieselEngine"));
}

#[test]
fn test_missing_descriptor_file_fails_the_bootstrap() {
    let dir = tempfile::tempdir().expect("tempdir");

    let err = Bootstrap::new(KilnConfig::default())
        .source(DeclarativeSource::from_path(dir.path().join("absent.toml"), catalog()))
        .start()
        .expect_err("missing file");
    assert!(matches!(err, Error::Io { .. }));
}
