//! Unit tests for interceptor and decorator enablement

use kiln_domain::ComponentId;
use kiln_domain::constants::CONFIG_ENABLED_INTERCEPTOR_PRIORITY;
use kiln_engine::interception::effective_priority;

fn enabled() -> Vec<String> {
    vec!["metrics".to_string(), "audit".to_string()]
}

#[test]
fn test_declared_priority_wins() {
    let id = ComponentId::new("metrics");
    assert_eq!(effective_priority(&id, Some(7), &enabled()), Some(7));
}

#[test]
fn test_configured_position_orders_after_declared_priorities() {
    let metrics = effective_priority(&ComponentId::new("metrics"), None, &enabled());
    let audit = effective_priority(&ComponentId::new("audit"), None, &enabled());

    assert_eq!(metrics, Some(CONFIG_ENABLED_INTERCEPTOR_PRIORITY));
    assert_eq!(audit, Some(CONFIG_ENABLED_INTERCEPTOR_PRIORITY + 1));
}

#[test]
fn test_neither_declared_nor_configured_is_disabled() {
    assert_eq!(effective_priority(&ComponentId::new("tracing"), None, &enabled()), None);
}
