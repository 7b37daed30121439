//! Bootstrap
//!
//! Turns metadata sources into a running [`Container`](crate::container::Container):
//!
//! ```text
//! KilnConfig ─► scopes ─► before_discovery ─► discover ─► after_type_discovery
//!                                                              │
//!   Container ◄─ after_deployment_validation ◄─ validate ◄─ normalize ◄─ after_bean_discovery
//! ```
//!
//! Definition problems and deployment problems are each collected in full
//! and reported as one error; a deployment never partially starts.

mod extension;
mod normalize;
mod orchestrator;
mod validation;

pub use extension::{AfterBeanDiscovery, AfterTypeDiscovery, BeforeDiscovery, Extension};
pub use orchestrator::Bootstrap;
pub use validation::DeploymentValidator;
