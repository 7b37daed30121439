//! Domain constants
//!
//! Names of the built-in qualifiers and the default ordering keys used by
//! observers, interceptors and decorators.

/// Qualifier carried by every component whose only explicit qualifiers are `@Named`/`@Any`
pub const DEFAULT_QUALIFIER: &str = "Default";

/// Qualifier carried by every component; requesting it matches any component
pub const ANY_QUALIFIER: &str = "Any";

/// Qualifier used for name-based lookup
pub const NAMED_QUALIFIER: &str = "Named";

/// Member of the `@Named` qualifier holding the name
pub const NAMED_VALUE_MEMBER: &str = "value";

/// Type key present in every type closure
pub const OBJECT_TYPE: &str = "object";

/// Priority assigned to observers that declare none
pub const DEFAULT_OBSERVER_PRIORITY: i32 = 2500;

/// Base priority for interceptors enabled through configuration instead of a priority
pub const CONFIG_ENABLED_INTERCEPTOR_PRIORITY: i32 = 5000;

/// Lowest priority an application component may declare
pub const PLATFORM_BEFORE: i32 = 0;

/// Upper bound of the application priority band
pub const PLATFORM_AFTER: i32 = 4000;
