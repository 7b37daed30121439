use crate::constants::OBJECT_TYPE;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Identity of a type inside a type closure
///
/// Keys built with [`TypeKey::of`] use the compiler's type name, so the same
/// Rust type always maps to the same key within one build. Keys built with
/// [`TypeKey::named`] come from external metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeKey(Cow<'static, str>);

impl TypeKey {
    /// Key of a Rust type, including unsized trait objects (`TypeKey::of::<dyn Engine>()`)
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self(Cow::Borrowed(std::any::type_name::<T>()))
    }

    /// Key from an externally supplied type name
    pub fn named<S: Into<String>>(name: S) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// The universal type every closure contains
    pub const fn object() -> Self {
        Self(Cow::Borrowed(OBJECT_TYPE))
    }

    /// Whether this is the universal type
    pub fn is_object(&self) -> bool {
        self.0 == OBJECT_TYPE
    }

    /// Full type name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment without generic arguments (`dyn app::car::Engine` → `Engine`)
    pub fn simple_name(&self) -> &str {
        let name = self.0.trim_start_matches("dyn ");
        let name = name.split('<').next().unwrap_or(name);
        name.rsplit("::")
            .next()
            .and_then(|segment| segment.rsplit('.').next())
            .unwrap_or(name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
