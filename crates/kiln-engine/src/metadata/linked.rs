use crate::metadata::{ComponentDefinition, MetadataSource};
use kiln_domain::error::Result;

/// Compile-time registration entry
///
/// ```ignore
/// #[linkme::distributed_slice(kiln_engine::metadata::COMPONENTS)]
/// static TURBO_ENGINE: ComponentEntry = ComponentEntry {
///     name: "turbo-engine",
///     description: "Turbo engine, application scoped",
///     definition: || Bean::builder::<TurboEngine>().scope(ScopeId::Application).build_default().into(),
/// };
/// ```
pub struct ComponentEntry {
    /// Unique entry name; entries are discovered in name order
    pub name: &'static str,
    /// Human-readable description
    pub description: &'static str,
    /// Builds the definition
    pub definition: fn() -> ComponentDefinition,
}

/// Components registered at compile time
#[linkme::distributed_slice]
pub static COMPONENTS: [ComponentEntry] = [..];

/// Source reading the [`COMPONENTS`] slice
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedComponents;

impl LinkedComponents {
    /// (name, description) of every linked entry, in discovery order
    pub fn entries() -> Vec<(&'static str, &'static str)> {
        sorted()
            .into_iter()
            .map(|entry| (entry.name, entry.description))
            .collect()
    }
}

impl MetadataSource for LinkedComponents {
    fn name(&self) -> &str {
        "linked"
    }

    fn discover(&self) -> Result<Vec<ComponentDefinition>> {
        Ok(sorted()
            .into_iter()
            .map(|entry| (entry.definition)())
            .collect())
    }
}

// Link order is unspecified; sort for a deterministic discovery index
fn sorted() -> Vec<&'static ComponentEntry> {
    let mut entries: Vec<&'static ComponentEntry> = COMPONENTS.iter().collect();
    entries.sort_by_key(|entry| entry.name);
    entries
}
