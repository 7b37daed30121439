//! Asynchronous observers on the worker pool

use crate::test_utils::{Tally, bootstrap, start, start_with};
use kiln_domain::ScopeId;
use kiln_domain::error::Error;
use kiln_engine::config::{ConfigBuilder, KilnConfig};
use kiln_engine::events::{ObserverContext, ObserverOutcome};
use kiln_engine::{Bean, Event, Observer};
use std::sync::{Arc, Barrier};

struct Ping;

impl Event for Ping {}

#[test]
fn test_async_observers_report_their_outcomes() {
    let delivered = Arc::new(Tally::default());
    let counter = Arc::clone(&delivered);
    let container = start(vec![
        Observer::of::<Ping>("worker")
            .asynchronous()
            .notify(move |_event: &Ping, _ctx: &ObserverContext<'_>| {
                counter.bump();
                Ok(())
            })
            .into(),
        Observer::of::<Ping>("broken")
            .asynchronous()
            .notify(|_event: &Ping, _ctx: &ObserverContext<'_>| Err(Error::internal("disk full")))
            .into(),
    ]);
    let contexts = container.contexts().expect("contexts");

    let delivery = container.fire(&contexts, Ping, &[]).expect("async failures never reach the caller");
    assert_eq!(delivery.len(), 2);
    let report = delivery.wait_blocking();

    assert_eq!(delivered.get(), 1);
    assert_eq!(report.delivered(), 1);
    assert!(!report.is_success());
    assert!(report.outcome("worker").is_some_and(ObserverOutcome::is_delivered));
    let failures: Vec<&str> = report.failures().map(|(id, _)| id).collect();
    assert_eq!(failures, vec!["broken"]);
}

#[test]
fn test_sync_observers_complete_before_fire_returns() {
    let sync_runs = Arc::new(Tally::default());
    let counter = Arc::clone(&sync_runs);
    let container = start(vec![
        Observer::of::<Ping>("background")
            .asynchronous()
            .priority(1)
            .notify(|_event: &Ping, _ctx: &ObserverContext<'_>| Ok(()))
            .into(),
        Observer::of::<Ping>("inline")
            .priority(2)
            .notify(move |_event: &Ping, _ctx: &ObserverContext<'_>| {
                counter.bump();
                Ok(())
            })
            .into(),
    ]);
    let contexts = container.contexts().expect("contexts");

    let delivery = container.fire(&contexts, Ping, &[]).expect("fire");
    assert_eq!(sync_runs.get(), 1);
    assert_eq!(delivery.len(), 1);
    assert!(delivery.wait_blocking().is_success());
}

#[test]
fn test_async_observer_runs_in_its_own_request_context() {
    #[derive(Default)]
    struct Audit;

    let created = Arc::new(Tally::default());
    let destroyed = Arc::new(Tally::default());
    let on_create = Arc::clone(&created);
    let on_destroy = Arc::clone(&destroyed);
    let container = start(vec![
        Bean::builder::<Audit>()
            .id("audit")
            .scope(ScopeId::Request)
            .post_construct(move |_| {
                on_create.bump();
                Ok(())
            })
            .pre_destroy(move |_| {
                on_destroy.bump();
                Ok(())
            })
            .build_default()
            .into(),
        Observer::of::<Ping>("auditor")
            .asynchronous()
            .notify(|_event: &Ping, ctx: &ObserverContext<'_>| {
                assert!(ctx.contexts().is_active(&ScopeId::Request));
                let audit = ctx.container().proxy::<Audit>(&[])?;
                audit.get(ctx.contexts()).map(|_| ())
            })
            .into(),
    ]);
    let contexts = container.contexts().expect("contexts");

    let report = container.fire(&contexts, Ping, &[]).expect("fire").wait_blocking();

    assert!(report.is_success());
    assert_eq!(created.get(), 1);
    assert_eq!(destroyed.get(), 1);
    assert!(!contexts.is_active(&ScopeId::Request));
}

#[test]
fn test_cancel_stops_observers_that_have_not_started() {
    let started = Arc::new(Barrier::new(2));
    let release = Arc::new(Barrier::new(2));
    let slow_started = Arc::clone(&started);
    let slow_release = Arc::clone(&release);
    let config = ConfigBuilder::new().with_async_workers(1).build();
    let container = start_with(
        config,
        vec![
            Observer::of::<Ping>("slow")
                .asynchronous()
                .priority(1)
                .notify(move |_event: &Ping, _ctx: &ObserverContext<'_>| {
                    slow_started.wait();
                    slow_release.wait();
                    Ok(())
                })
                .into(),
            Observer::of::<Ping>("queued")
                .asynchronous()
                .priority(2)
                .notify(|_event: &Ping, _ctx: &ObserverContext<'_>| Ok(()))
                .into(),
        ],
    );
    let contexts = container.contexts().expect("contexts");

    let delivery = container.fire(&contexts, Ping, &[]).expect("fire");
    started.wait();
    delivery.cancel();
    release.wait();
    let report = delivery.wait_blocking();

    assert!(report.outcome("slow").is_some_and(ObserverOutcome::is_delivered));
    assert!(report.outcome("queued").is_some_and(ObserverOutcome::is_cancelled));
    assert_eq!(report.cancelled(), 1);
}

#[test]
fn test_async_fire_after_shutdown_is_rejected() {
    let container = start(vec![
        Observer::of::<Ping>("worker")
            .asynchronous()
            .notify(|_event: &Ping, _ctx: &ObserverContext<'_>| Ok(()))
            .into(),
    ]);
    let contexts = container.contexts().expect("contexts");
    container.shutdown().expect("shutdown");

    let err = container.fire(&contexts, Ping, &[]).expect_err("stopped");
    assert!(matches!(err, Error::IllegalState { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_async_observers_on_a_host_runtime() {
    let delivered = Arc::new(Tally::default());
    let counter = Arc::clone(&delivered);
    let container = bootstrap(
        KilnConfig::default(),
        vec![
            Observer::of::<Ping>("worker")
                .asynchronous()
                .notify(move |_event: &Ping, _ctx: &ObserverContext<'_>| {
                    counter.bump();
                    Ok(())
                })
                .into(),
        ],
    )
    .runtime_handle(tokio::runtime::Handle::current())
    .start()
    .expect("start");
    let contexts = container.contexts().expect("contexts");

    let report = container.fire(&contexts, Ping, &[]).expect("fire").wait().await;

    assert!(report.is_success());
    assert_eq!(report.len(), 1);
    assert_eq!(delivered.get(), 1);
}
