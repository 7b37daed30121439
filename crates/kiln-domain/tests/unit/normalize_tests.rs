//! Unit tests for metadata normalization

use kiln_domain::{
    Annotation, DescriptorFactory, InjectionPoint, InterceptorBinding, Qualifier, ScopeId,
    TypeKey, TypeMetadata,
};

trait Engine {}

fn engine_metadata(class: &str) -> TypeMetadata {
    TypeMetadata::new(class).with_type(TypeKey::of::<dyn Engine>())
}

#[test]
fn test_unqualified_component_gets_default_and_any() {
    let factory = DescriptorFactory::default();
    let descriptor = factory
        .create(&engine_metadata("acme::V6"), 0)
        .expect("valid")
        .expect("not vetoed");

    assert!(descriptor.qualifiers.contains(&Qualifier::default_marker()));
    assert!(descriptor.qualifiers.contains(&Qualifier::any()));
    assert!(descriptor.has_type(&TypeKey::object()));
    assert_eq!(descriptor.scope, ScopeId::Dependent);
    assert_eq!(descriptor.id.as_str(), "acme::V6");
}

#[test]
fn test_explicit_qualifier_drops_default() {
    let metadata = engine_metadata("acme::V8")
        .with_annotation(Annotation::Qualifier(Qualifier::new("Turbo")));
    let descriptor = DescriptorFactory::default()
        .create(&metadata, 1)
        .expect("valid")
        .expect("not vetoed");

    assert!(!descriptor.qualifiers.contains(&Qualifier::default_marker()));
    assert!(descriptor.qualifiers.contains(&Qualifier::new("Turbo")));
    assert!(descriptor.qualifiers.contains(&Qualifier::any()));
}

#[test]
fn test_default_name_from_simple_class_name() {
    let metadata = engine_metadata("acme::TurboEngine").with_annotation(Annotation::Named(None));
    let descriptor = DescriptorFactory::default()
        .create(&metadata, 0)
        .expect("valid")
        .expect("not vetoed");

    assert_eq!(descriptor.name.as_deref(), Some("turboEngine"));
    assert!(descriptor.qualifiers.contains(&Qualifier::default_marker()));
    assert!(descriptor.qualifiers.contains(&Qualifier::named("turboEngine")));
}

#[test]
fn test_vetoed_type_yields_nothing() {
    let metadata = engine_metadata("acme::Legacy").with_annotation(Annotation::Vetoed);
    assert!(matches!(DescriptorFactory::default().create(&metadata, 0), Ok(None)));
}

#[test]
fn test_alternative_starts_disabled() {
    let metadata = engine_metadata("acme::Mock").with_annotation(Annotation::Alternative);
    let descriptor = DescriptorFactory::default()
        .create(&metadata, 0)
        .expect("valid")
        .expect("not vetoed");
    assert!(descriptor.alternative);
    assert!(!descriptor.is_enabled());
}

#[test]
fn test_all_problems_are_reported() {
    let metadata = TypeMetadata::new("acme::Broken")
        .with_annotation(Annotation::Scope(ScopeId::Request))
        .with_annotation(Annotation::Scope(ScopeId::Session))
        .with_annotation(Annotation::Priority(1))
        .with_annotation(Annotation::Priority(2))
        .with_injection_point(InjectionPoint::new(TypeKey::object()));

    let problems = DescriptorFactory::default()
        .create(&metadata, 0)
        .expect_err("invalid");

    assert_eq!(problems.len(), 4, "{problems:?}");
    assert!(problems.iter().any(|p| p.contains("type closure is empty")));
    assert!(problems.iter().any(|p| p.contains("more than one scope")));
    assert!(problems.iter().any(|p| p.contains("more than one priority")));
    assert!(problems.iter().any(|p| p.contains("universal type")));
}

#[test]
fn test_custom_scope_must_be_registered() {
    let metadata = engine_metadata("acme::Batch")
        .with_annotation(Annotation::Scope(ScopeId::Custom("batch".into())));

    let problems = DescriptorFactory::default()
        .create(&metadata, 0)
        .expect_err("unknown scope");
    assert!(problems[0].contains("unknown scope"));

    let descriptor = DescriptorFactory::new(["batch"])
        .create(&metadata, 0)
        .expect("valid")
        .expect("not vetoed");
    assert_eq!(descriptor.scope, ScopeId::Custom("batch".into()));
}

#[test]
fn test_method_bindings_are_grouped() {
    let metadata = engine_metadata("acme::Audited")
        .with_annotation(Annotation::InterceptorBinding(InterceptorBinding::new("Logged")))
        .with_annotation(Annotation::MethodBinding {
            method: "start".into(),
            binding: InterceptorBinding::new("Timed"),
        });
    let descriptor = DescriptorFactory::default()
        .create(&metadata, 0)
        .expect("valid")
        .expect("not vetoed");

    assert_eq!(descriptor.bindings_for("start").len(), 2);
    assert_eq!(descriptor.bindings_for("stop").len(), 1);
}
