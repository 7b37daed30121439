//! Unit tests for domain error types

use kiln_domain::Error;

#[test]
fn test_definition_error_keeps_every_problem() {
    let error = Error::definition(["first problem", "second problem"]);
    assert_eq!(error.problems().len(), 2);
    assert!(error.is_fatal());

    let display = error.to_string();
    assert!(display.contains("first problem"));
    assert!(display.contains("second problem"));
}

#[test]
fn test_context_not_active_error() {
    let error = Error::context_not_active("request");
    match &error {
        Error::ContextNotActive { scope } => assert_eq!(scope, "request"),
        _ => panic!("Expected ContextNotActive error"),
    }
    assert!(error.is_context_not_active());
    assert!(!error.is_fatal());
}

#[test]
fn test_ambiguous_error_lists_candidates() {
    let error = Error::ambiguous("dyn Engine @Default", ["V6", "V8"]);
    match &error {
        Error::Ambiguous { candidates, .. } => assert_eq!(candidates, &["V6", "V8"]),
        _ => panic!("Expected Ambiguous error"),
    }
    assert!(error.is_ambiguous());
    assert!(error.to_string().contains("V6, V8"));
}

#[test]
fn test_creation_error_with_source() {
    let io = std::io::Error::other("disk gone");
    let error = Error::creation_with_source("Garage", "constructor failed", io);

    match &error {
        Error::Creation {
            component, source, ..
        } => {
            assert_eq!(component, "Garage");
            assert!(source.is_some());
        }
        _ => panic!("Expected Creation error"),
    }
}

#[test]
fn test_observer_failed_wraps_cause() {
    let error = Error::observer_failed("Audit::on_sale", Error::illegal_state("closed"));
    match error {
        Error::ObserverInvocation {
            observer, message, ..
        } => {
            assert_eq!(observer, "Audit::on_sale");
            assert!(message.contains("closed"));
        }
        _ => panic!("Expected ObserverInvocation error"),
    }
}

#[test]
fn test_json_error_conversion() {
    let parse: Result<serde_json::Value, _> = serde_json::from_str("{not json");
    let error: Error = parse.unwrap_err().into();
    assert!(matches!(error, Error::Json { .. }));
}
