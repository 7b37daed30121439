use crate::interception::chain::Link;
use kiln_domain::ComponentId;
use kiln_domain::error::{Error, Result};
use serde_json::Value;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;

/// Type-erased method argument
pub type Parameter = Box<dyn Any + Send>;

/// Type-erased method result
pub type ReturnValue = Box<dyn Any + Send>;

/// A method call about to enter an interception chain
#[derive(Default)]
pub struct Invocation {
    method: String,
    parameters: Vec<Parameter>,
    data: HashMap<String, Value>,
}

impl Invocation {
    /// Call of `method` without arguments
    pub fn new<S: Into<String>>(method: S) -> Self {
        Self {
            method: method.into(),
            ..Self::default()
        }
    }

    /// Append an argument
    pub fn with_parameter<P: Any + Send>(mut self, parameter: P) -> Self {
        self.parameters.push(Box::new(parameter));
        self
    }

    /// Seed the context data shared by the chain's links
    pub fn with_data<K: Into<String>, V: Into<Value>>(mut self, key: K, value: V) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Invoked method
    pub fn method(&self) -> &str {
        &self.method
    }

    pub(crate) fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }
}

impl fmt::Debug for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("method", &self.method)
            .field("parameters", &self.parameters.len())
            .field("data", &self.data)
            .finish()
    }
}

pub(crate) type Target<'a> = Box<dyn FnOnce(&[Parameter]) -> Result<ReturnValue> + 'a>;

/// One invocation as seen by the links of a chain
pub struct InvocationContext<'a> {
    component: &'a ComponentId,
    method: String,
    parameters: Vec<Parameter>,
    data: HashMap<String, Value>,
    links: &'a [Link],
    position: usize,
    target: Option<Target<'a>>,
}

impl<'a> InvocationContext<'a> {
    pub(crate) fn new(
        component: &'a ComponentId,
        invocation: Invocation,
        links: &'a [Link],
        target: Target<'a>,
    ) -> Self {
        Self {
            component,
            method: invocation.method,
            parameters: invocation.parameters,
            data: invocation.data,
            links,
            position: 0,
            target: Some(target),
        }
    }

    /// Component the call targets
    pub fn component(&self) -> &ComponentId {
        self.component
    }

    /// Invoked method
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Number of arguments
    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Argument at `index`, if present and of type `P`
    pub fn parameter<P: Any>(&self, index: usize) -> Option<&P> {
        self.parameters.get(index)?.downcast_ref::<P>()
    }

    /// Replace the argument at `index`
    pub fn set_parameter<P: Any + Send>(&mut self, index: usize, value: P) -> Result<()> {
        let slot = self.parameters.get_mut(index).ok_or_else(|| {
            Error::illegal_state(format!(
                "{}::{} has no parameter at index {index}",
                self.component, self.method
            ))
        })?;
        *slot = Box::new(value);
        Ok(())
    }

    /// Data shared by every link of this invocation
    pub fn data(&self) -> &HashMap<String, Value> {
        &self.data
    }

    /// Mutable access to the shared data
    pub fn data_mut(&mut self) -> &mut HashMap<String, Value> {
        &mut self.data
    }

    /// Call the next link, or the target method after the last one
    ///
    /// The target runs at most once per invocation.
    pub fn proceed(&mut self) -> Result<ReturnValue> {
        let links = self.links;
        if let Some(link) = links.get(self.position) {
            self.position += 1;
            let result = link.invoke(self);
            self.position -= 1;
            return result;
        }
        let target = self.target.take().ok_or_else(|| {
            Error::illegal_state(format!(
                "{}::{} already proceeded to the target",
                self.component, self.method
            ))
        })?;
        target(&self.parameters)
    }
}

impl fmt::Debug for InvocationContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("component", self.component)
            .field("method", &self.method)
            .field("position", &self.position)
            .finish_non_exhaustive()
    }
}
