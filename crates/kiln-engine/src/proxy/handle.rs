use kiln_domain::{ComponentId, TypeKey};
use serde::{Deserialize, Serialize};

/// Serialized form of a client proxy
///
/// Carries only the component id and the contract the proxy was typed to;
/// the live instance is looked up again after revival.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProxyHandle {
    /// Target component
    pub component: ComponentId,
    /// Contract the proxy implements
    pub contract: TypeKey,
}
