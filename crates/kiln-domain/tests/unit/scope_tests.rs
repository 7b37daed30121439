//! Unit tests for scope identifiers and definitions

use kiln_domain::{ScopeDefinition, ScopeId};

#[test]
fn test_parse_builtin_scopes_case_insensitively() {
    let parsed: ScopeId = "Request".parse().expect("infallible");
    assert_eq!(parsed, ScopeId::Request);
    let parsed: ScopeId = "tenant".parse().expect("infallible");
    assert_eq!(parsed, ScopeId::Custom("tenant".to_string()));
}

#[test]
fn test_scope_serializes_as_name() {
    let json = serde_json::to_string(&ScopeId::Conversation).expect("serialize");
    assert_eq!(json, "\"conversation\"");
    let back: ScopeId = serde_json::from_str("\"batch\"").expect("deserialize");
    assert_eq!(back, ScopeId::Custom("batch".to_string()));
}

#[test]
fn test_builtin_definitions() {
    let dependent = ScopeDefinition::builtin(&ScopeId::Dependent).expect("builtin");
    assert!(!dependent.normal);
    assert!(dependent.is_dependent());

    let singleton = ScopeDefinition::builtin(&ScopeId::Singleton).expect("builtin");
    assert!(!singleton.normal && singleton.shared);

    let application = ScopeDefinition::builtin(&ScopeId::Application).expect("builtin");
    assert!(application.normal && application.shared);

    let session = ScopeDefinition::builtin(&ScopeId::Session).expect("builtin");
    assert!(session.passivating && !session.shared);

    assert!(ScopeDefinition::builtin(&ScopeId::Custom("x".into())).is_none());
    assert_eq!(ScopeDefinition::builtins().len(), 6);
}

#[test]
fn test_shutdown_rank_orders_thread_affine_first() {
    let rank = |id: ScopeId| ScopeDefinition::builtin(&id).map(|d| d.shutdown_rank());
    assert!(rank(ScopeId::Request) < rank(ScopeId::Conversation));
    assert!(rank(ScopeId::Conversation) < rank(ScopeId::Session));
    assert!(rank(ScopeId::Session) < rank(ScopeId::Application));
    assert!(rank(ScopeId::Application) < rank(ScopeId::Singleton));

    let shared_custom = ScopeDefinition::custom("tenant", true, true, false);
    let affine_custom = ScopeDefinition::custom("batch", true, false, false);
    assert!(affine_custom.shutdown_rank() < shared_custom.shutdown_rank());
    assert!(Some(shared_custom.shutdown_rank()) < rank(ScopeId::Application));
}
