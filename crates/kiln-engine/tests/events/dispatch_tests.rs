//! Synchronous event dispatch

use crate::test_utils::{Tally, bootstrap, start, start_err};
use kiln_domain::error::Error;
use kiln_domain::events::{ContainerInitialized, ContainerShutdown};
use kiln_domain::{Qualifier, ScopeId, TypeKey};
use kiln_engine::config::KilnConfig;
use kiln_engine::events::ObserverContext;
use kiln_engine::{Bean, Event, Observer};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

struct Ping(u32);

impl Event for Ping {}

struct Alarm;

impl Event for Alarm {
    fn event_types(&self) -> Vec<TypeKey> {
        vec![TypeKey::of::<Self>(), TypeKey::named("Alert")]
    }
}

#[derive(Default)]
struct Gauge {
    total: AtomicU32,
}

type Journal = Arc<Mutex<Vec<String>>>;

fn journaling(id: &str, priority: i32, journal: &Journal) -> Observer {
    let journal = Arc::clone(journal);
    let entry = id.to_string();
    Observer::of::<Ping>(id)
        .priority(priority)
        .notify(move |_event: &Ping, _ctx: &ObserverContext<'_>| {
            journal.lock().push(entry.clone());
            Ok(())
        })
}

#[test]
fn test_firing_without_observers_is_a_no_op() {
    let container = start(Vec::new());
    let contexts = container.contexts().expect("contexts");

    let delivery = container.fire(&contexts, Ping(1), &[]).expect("fire");
    assert!(delivery.is_empty());
}

#[test]
fn test_observers_run_in_priority_order() {
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));
    let container = start(vec![
        journaling("late", 300, &journal).into(),
        journaling("early", 100, &journal).into(),
        journaling("middle", 200, &journal).into(),
    ]);
    let contexts = container.contexts().expect("contexts");

    container.fire(&contexts, Ping(1), &[]).expect("fire");
    assert_eq!(*journal.lock(), vec!["early", "middle", "late"]);
}

#[test]
fn test_equal_priorities_keep_discovery_order() {
    let journal: Journal = Arc::new(Mutex::new(Vec::new()));
    let container = start(vec![
        journaling("first", 10, &journal).into(),
        journaling("second", 10, &journal).into(),
    ]);
    let contexts = container.contexts().expect("contexts");

    container.fire(&contexts, Ping(1), &[]).expect("fire");
    assert_eq!(*journal.lock(), vec!["first", "second"]);
}

#[test]
fn test_failing_observer_aborts_dispatch() {
    let after = Arc::new(Tally::default());
    let counter = Arc::clone(&after);
    let container = start(vec![
        Observer::of::<Ping>("broken")
            .priority(1)
            .notify(|_event: &Ping, _ctx: &ObserverContext<'_>| Err(Error::internal("boom")))
            .into(),
        Observer::of::<Ping>("after")
            .priority(2)
            .notify(move |_event: &Ping, _ctx: &ObserverContext<'_>| {
                counter.bump();
                Ok(())
            })
            .into(),
    ]);
    let contexts = container.contexts().expect("contexts");

    let err = container.fire(&contexts, Ping(1), &[]).expect_err("aborts");
    assert!(matches!(err, Error::ObserverInvocation { .. }));
    assert!(err.to_string().contains("broken"));
    assert_eq!(after.get(), 0);
}

#[test]
fn test_tolerant_observer_failure_is_logged_and_skipped() {
    let after = Arc::new(Tally::default());
    let counter = Arc::clone(&after);
    let container = start(vec![
        Observer::of::<Ping>("flaky")
            .priority(1)
            .tolerant()
            .notify(|_event: &Ping, _ctx: &ObserverContext<'_>| Err(Error::internal("boom")))
            .into(),
        Observer::of::<Ping>("after")
            .priority(2)
            .notify(move |_event: &Ping, _ctx: &ObserverContext<'_>| {
                counter.bump();
                Ok(())
            })
            .into(),
    ]);
    let contexts = container.contexts().expect("contexts");

    container.fire(&contexts, Ping(1), &[]).expect("tolerated");
    assert_eq!(after.get(), 1);
}

#[test]
fn test_qualified_observer_only_sees_matching_events() {
    let urgent = Arc::new(Tally::default());
    let every = Arc::new(Tally::default());
    let urgent_counter = Arc::clone(&urgent);
    let every_counter = Arc::clone(&every);
    let container = start(vec![
        Observer::of::<Ping>("urgent")
            .qualifier(Qualifier::new("Urgent"))
            .notify(move |_event: &Ping, _ctx: &ObserverContext<'_>| {
                urgent_counter.bump();
                Ok(())
            })
            .into(),
        Observer::of::<Ping>("every")
            .notify(move |_event: &Ping, ctx: &ObserverContext<'_>| {
                every_counter.bump();
                assert!(ctx.event::<Ping>().is_some());
                Ok(())
            })
            .into(),
    ]);
    let contexts = container.contexts().expect("contexts");

    container.fire(&contexts, Ping(1), &[]).expect("fire");
    container.fire(&contexts, Ping(2), &[Qualifier::new("Urgent")]).expect("fire");

    assert_eq!(urgent.get(), 1);
    assert_eq!(every.get(), 2);
}

#[test]
fn test_observers_of_broader_types_receive_the_event() {
    let alerts = Arc::new(Tally::default());
    let everything = Arc::new(Tally::default());
    let alert_counter = Arc::clone(&alerts);
    let everything_counter = Arc::clone(&everything);
    let container = start(vec![
        Observer::of_type("alerts", TypeKey::named("Alert"))
            .notify_any(move |ctx: &ObserverContext<'_>| {
                assert!(ctx.event::<Alarm>().is_some());
                alert_counter.bump();
                Ok(())
            })
            .into(),
        Observer::of_type("everything", TypeKey::object())
            .notify_any(move |_ctx: &ObserverContext<'_>| {
                everything_counter.bump();
                Ok(())
            })
            .into(),
    ]);
    let contexts = container.contexts().expect("contexts");
    // ContainerInitialized already reached the universal observer
    assert_eq!(everything.get(), 1);

    container.fire(&contexts, Alarm, &[]).expect("fire");
    container.fire(&contexts, Ping(1), &[]).expect("fire");

    assert_eq!(alerts.get(), 1);
    assert_eq!(everything.get(), 3);
}

#[test]
fn test_component_observer_receives_its_instance() {
    let container = start(vec![
        Bean::builder::<Gauge>()
            .id("gauge")
            .scope(ScopeId::Application)
            .build_default()
            .into(),
        Observer::of::<Ping>("gauge-reading")
            .on_component::<Gauge, Ping, _>("gauge", |gauge, ping, _ctx| {
                gauge.total.fetch_add(ping.0, Ordering::SeqCst);
                Ok(())
            })
            .into(),
    ]);
    let contexts = container.contexts().expect("contexts");

    container.fire(&contexts, Ping(3), &[]).expect("fire");
    container.fire(&contexts, Ping(4), &[]).expect("fire");

    let gauge = container.proxy::<Gauge>(&[]).expect("proxy").get(&contexts).expect("gauge");
    assert_eq!(gauge.total.load(Ordering::SeqCst), 7);
}

#[test]
fn test_conditional_observer_skips_missing_instance() {
    let container = start(vec![
        Bean::builder::<Gauge>()
            .id("gauge")
            .scope(ScopeId::Application)
            .build_default()
            .into(),
        Observer::of::<Ping>("gauge-reading")
            .if_exists()
            .on_component::<Gauge, Ping, _>("gauge", |gauge, ping, _ctx| {
                gauge.total.fetch_add(ping.0, Ordering::SeqCst);
                Ok(())
            })
            .into(),
    ]);
    let contexts = container.contexts().expect("contexts");
    let proxy = container.proxy::<Gauge>(&[]).expect("proxy");

    container.fire(&contexts, Ping(5), &[]).expect("fire");
    let store = contexts.store(&ScopeId::Application).expect("store");
    assert!(!store.contains(proxy.component()));

    let gauge = proxy.get(&contexts).expect("gauge");
    container.fire(&contexts, Ping(6), &[]).expect("fire");
    assert_eq!(gauge.total.load(Ordering::SeqCst), 6);
}

#[test]
fn test_conditional_observer_on_dependent_owner_is_a_definition_error() {
    let err = start_err(
        KilnConfig::default(),
        vec![
            Bean::builder::<Gauge>().id("gauge").build_default().into(),
            Observer::of::<Ping>("gauge-reading")
                .if_exists()
                .on_component::<Gauge, Ping, _>("gauge", |_gauge, _ping, _ctx| Ok(()))
                .into(),
        ],
    );

    assert!(matches!(err, Error::Definition { .. }));
}

#[test]
fn test_container_lifecycle_events_are_observed() {
    let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let started = Arc::clone(&seen);
    let stopped = Arc::clone(&seen);
    let container = bootstrap(
        KilnConfig::default(),
        vec![
            Observer::of::<ContainerInitialized>("on-start")
                .notify(move |event: &ContainerInitialized, _ctx: &ObserverContext<'_>| {
                    started.lock().push(format!("started {}", event.observers));
                    Ok(())
                })
                .into(),
            Observer::of::<ContainerShutdown>("on-stop")
                .notify(move |_event: &ContainerShutdown, _ctx: &ObserverContext<'_>| {
                    stopped.lock().push("stopped".to_string());
                    Ok(())
                })
                .into(),
        ],
    )
    .start()
    .expect("start");

    assert_eq!(*seen.lock(), vec!["started 2"]);
    container.shutdown().expect("shutdown");
    assert_eq!(*seen.lock(), vec!["started 2", "stopped"]);
}

#[test]
fn test_observer_can_fire_follow_up_events() {
    struct Pong;
    impl Event for Pong {}

    let pongs = Arc::new(Tally::default());
    let counter = Arc::clone(&pongs);
    let container = start(vec![
        Observer::of::<Ping>("relay")
            .notify(|_event: &Ping, ctx: &ObserverContext<'_>| {
                ctx.container().fire(ctx.contexts(), Pong, &[]).map(|_| ())
            })
            .into(),
        Observer::of::<Pong>("pong")
            .notify(move |_event: &Pong, _ctx: &ObserverContext<'_>| {
                counter.bump();
                Ok(())
            })
            .into(),
    ]);
    let contexts = container.contexts().expect("contexts");

    container.fire(&contexts, Ping(1), &[]).expect("fire");
    assert_eq!(pongs.get(), 1);
}
