//! Unit tests for qualifiers and interceptor bindings

use kiln_domain::{InterceptorBinding, Qualifier};
use std::collections::HashSet;

#[test]
fn test_member_values_participate_in_equality() {
    let v8 = Qualifier::new("Turbo").with_member("cylinders", 8);
    let v6 = Qualifier::new("Turbo").with_member("cylinders", 6);
    assert_ne!(v8, v6);
    assert_eq!(v8, Qualifier::new("Turbo").with_member("cylinders", 8));
}

#[test]
fn test_hash_ignores_nonbinding_members() {
    let mut set = HashSet::new();
    set.insert(Qualifier::new("Turbo").with_nonbinding_member("note", "a"));
    set.insert(Qualifier::new("Turbo").with_nonbinding_member("note", "b"));
    assert_eq!(set.len(), 1);
}

#[test]
fn test_named_only_request_has_no_implicit_default() {
    let normalized = Qualifier::normalize_request(&[Qualifier::named("garage")]);
    assert_eq!(normalized, vec![Qualifier::named("garage")]);
}

#[test]
fn test_ordering_agrees_with_equality() {
    let in_kind = Qualifier::new("A(b=1)");
    let in_member = Qualifier::new("A").with_member("b", 1);

    assert_ne!(in_kind, in_member);
    assert_ne!(in_kind.cmp(&in_member), std::cmp::Ordering::Equal);

    let mut requested = vec![in_member.clone(), in_kind.clone()];
    requested.sort();
    requested.dedup();
    assert_eq!(requested.len(), 2);

    let noted = Qualifier::new("A").with_member("b", 1).with_nonbinding_member("note", "x");
    assert_eq!(noted.cmp(&in_member), std::cmp::Ordering::Equal);
    assert_eq!(noted, in_member);
}

#[test]
fn test_explicit_request_has_no_default() {
    let normalized = Qualifier::normalize_request(&[Qualifier::new("Turbo"), Qualifier::new("Turbo")]);
    assert_eq!(normalized, vec![Qualifier::new("Turbo")]);
}

#[test]
fn test_normalized_requests_are_order_independent() {
    let a = Qualifier::normalize_request(&[Qualifier::new("A"), Qualifier::new("B")]);
    let b = Qualifier::normalize_request(&[Qualifier::new("B"), Qualifier::new("A")]);
    assert_eq!(a, b);
}

#[test]
fn test_satisfied_by_requires_every_qualifier() {
    let available = [Qualifier::new("Turbo"), Qualifier::new("Diesel"), Qualifier::any()];
    assert!(Qualifier::satisfied_by(&[Qualifier::new("Turbo")], &available));
    assert!(Qualifier::satisfied_by(
        &[Qualifier::new("Turbo"), Qualifier::new("Diesel")],
        &available
    ));
    assert!(!Qualifier::satisfied_by(
        &[Qualifier::new("Turbo"), Qualifier::new("Electric")],
        &available
    ));
}

#[test]
fn test_named_value() {
    assert_eq!(Qualifier::named("garage").name_value(), Some("garage"));
    assert_eq!(Qualifier::new("Turbo").name_value(), None);
}

#[test]
fn test_display_includes_members() {
    let qualifier = Qualifier::new("Turbo").with_member("cylinders", 8);
    assert_eq!(qualifier.to_string(), "@Turbo(cylinders = 8)");
}

#[test]
fn test_binding_serde_round_trip() {
    let binding = InterceptorBinding::new("Logged").with_member("level", "info");
    let json = serde_json::to_string(&binding).expect("serialize");
    let back: InterceptorBinding = serde_json::from_str(&json).expect("deserialize");
    assert_eq!(back, binding);
    assert_eq!(back.kind(), "Logged");
}
