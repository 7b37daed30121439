//! Dynamic lookup through `Instance`

use crate::test_utils::{Engine, StandardEngine, Tally, TurboEngine, start, turbo};
use kiln_domain::{Qualifier, ScopeId};
use kiln_engine::Bean;
use kiln_engine::metadata::ComponentDefinition;
use std::sync::Arc;

fn dependent_engines(destroyed: &Arc<Tally>) -> Vec<ComponentDefinition> {
    let standard = Arc::clone(destroyed);
    let fast = Arc::clone(destroyed);
    vec![
        Bean::builder::<StandardEngine>()
            .id("standard")
            .exposes::<dyn Engine>(|engine| engine)
            .pre_destroy(move |_| {
                standard.bump();
                Ok(())
            })
            .build_default()
            .into(),
        Bean::builder::<TurboEngine>()
            .id("turbo")
            .exposes::<dyn Engine>(|engine| engine)
            .qualifier(turbo())
            .pre_destroy(move |_| {
                fast.bump();
                Ok(())
            })
            .build_default()
            .into(),
    ]
}

#[test]
fn test_select_narrows_the_lookup() {
    let destroyed = Arc::new(Tally::default());
    let container = start(dependent_engines(&destroyed));
    let contexts = container.contexts().expect("contexts");

    let engines = container.instance::<dyn Engine>().select(&[Qualifier::any()]);
    assert!(engines.is_ambiguous());
    assert!(!engines.is_resolvable());

    let fast = engines.select(&[turbo()]);
    assert!(fast.is_resolvable());
    let reference = fast.get(&contexts).expect("turbo");
    assert_eq!(reference.get(&contexts).expect("instance").model(), "turbo");

    assert!(container.instance::<dyn Engine>().select(&[Qualifier::new("Electric")]).is_unsatisfied());
}

#[test]
fn test_iterates_every_match() {
    let destroyed = Arc::new(Tally::default());
    let container = start(dependent_engines(&destroyed));
    let contexts = container.contexts().expect("contexts");

    let engines = container.instance::<dyn Engine>().select(&[Qualifier::any()]);
    let mut models: Vec<&'static str> = engines
        .iter(&contexts)
        .map(|reference| reference.and_then(|r| r.get(&contexts)).map(|engine| engine.model()))
        .collect::<Result<_, _>>()
        .expect("every match creates");
    models.sort_unstable();
    assert_eq!(models, vec!["standard", "turbo"]);
}

#[test]
fn test_destroy_releases_a_dependent_instance() {
    let destroyed = Arc::new(Tally::default());
    let container = start(dependent_engines(&destroyed));
    let contexts = container.contexts().expect("contexts");

    let engines = container.instance::<dyn Engine>();
    let reference = engines.get(&contexts).expect("standard");
    assert!(engines.destroy(&contexts, &reference).expect("destroy"));
    assert_eq!(destroyed.get(), 1);

    assert!(!engines.destroy(&contexts, &reference).expect("already gone"));
    assert_eq!(destroyed.get(), 1);
}

#[test]
fn test_dropping_the_handle_destroys_its_dependents() {
    let destroyed = Arc::new(Tally::default());
    let container = start(dependent_engines(&destroyed));
    let contexts = container.contexts().expect("contexts");

    {
        let engines = container.instance::<dyn Engine>().select(&[Qualifier::any()]);
        let created = engines.iter(&contexts).filter(Result::is_ok).count();
        assert_eq!(created, 2);
        assert_eq!(destroyed.get(), 0);
    }
    assert_eq!(destroyed.get(), 2);
}

#[test]
fn test_destroy_through_a_proxy_resets_the_contextual_instance() {
    let destroyed = Arc::new(Tally::default());
    let counter = Arc::clone(&destroyed);
    let container = start(vec![
        Bean::builder::<StandardEngine>()
            .id("standard")
            .exposes::<dyn Engine>(|engine| engine)
            .scope(ScopeId::Application)
            .pre_destroy(move |_| {
                counter.bump();
                Ok(())
            })
            .build_default()
            .into(),
    ]);
    let contexts = container.contexts().expect("contexts");

    let engines = container.instance::<dyn Engine>();
    let reference = engines.get(&contexts).expect("proxy");
    assert!(reference.is_proxy());
    let first = reference.get(&contexts).expect("instance");

    assert!(engines.destroy(&contexts, &reference).expect("destroy"));
    assert_eq!(destroyed.get(), 1);
    let second = reference.get(&contexts).expect("recreated");
    assert!(!Arc::ptr_eq(&first, &second));
}
