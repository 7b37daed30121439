//! Shared fixtures for the engine integration tests

#![allow(dead_code)]

use kiln_domain::Qualifier;
use kiln_domain::error::Error;
use kiln_engine::config::KilnConfig;
use kiln_engine::metadata::ComponentDefinition;
use kiln_engine::{Bootstrap, Container};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Contract shared by the engine fixtures
pub trait Engine: Send + Sync {
    fn model(&self) -> &'static str;
}

#[derive(Default)]
pub struct StandardEngine;

impl Engine for StandardEngine {
    fn model(&self) -> &'static str {
        "standard"
    }
}

#[derive(Default)]
pub struct TurboEngine;

impl Engine for TurboEngine {
    fn model(&self) -> &'static str {
        "turbo"
    }
}

/// The `@Turbo` qualifier
pub fn turbo() -> Qualifier {
    Qualifier::new("Turbo")
}

/// Thread-safe counter for lifecycle callbacks
#[derive(Debug, Default)]
pub struct Tally(AtomicUsize);

impl Tally {
    pub fn bump(&self) -> usize {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Bootstrap with `definitions` registered programmatically
pub fn bootstrap(config: KilnConfig, definitions: Vec<ComponentDefinition>) -> Bootstrap {
    definitions
        .into_iter()
        .fold(Bootstrap::new(config), |bootstrap, definition| bootstrap.register(definition))
}

/// Start a container with the default configuration
pub fn start(definitions: Vec<ComponentDefinition>) -> Container {
    start_with(KilnConfig::default(), definitions)
}

/// Start a container with `config`
pub fn start_with(config: KilnConfig, definitions: Vec<ComponentDefinition>) -> Container {
    bootstrap(config, definitions)
        .start()
        .expect("container should start")
}

/// The error a failing bootstrap reports
pub fn start_err(config: KilnConfig, definitions: Vec<ComponentDefinition>) -> Error {
    bootstrap(config, definitions)
        .start()
        .expect_err("bootstrap should fail")
}
