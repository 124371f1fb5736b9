//! Explicit delegation: a host holds named components and routes calls to them.
//!
//! Unlike [`mixin`](crate::mixin::mixin), nothing is copied. Every component keeps
//! its own state and its exposed method list is fixed when the host is assembled,
//! so collisions surface at assembly time instead of as silent overwrites.

use std::collections::HashMap;
use std::fmt;

use log::debug;

use crate::error::ObjectError;
use crate::mixin::list_methods_of;
use crate::objects::object::ObjectRef;
use crate::strategy::MergeStrategy;
use crate::value::Value;

pub trait Capability {
    fn name(&self) -> &str;

    /// Method names this component answers to.
    fn exposed(&self) -> Vec<String>;

    fn call(&self, method: &str, args: &[Value]) -> Result<Value, ObjectError>;
}

/// A donor object used as a component; exposes the callables it owns.
pub struct ObjectCapability {
    name: String,
    object: ObjectRef,
}

impl ObjectCapability {
    pub fn new(name: impl Into<String>, object: ObjectRef) -> Self {
        ObjectCapability { name: name.into(), object }
    }

    pub fn object(&self) -> &ObjectRef {
        &self.object
    }
}

impl Capability for ObjectCapability {
    fn name(&self) -> &str {
        &self.name
    }

    fn exposed(&self) -> Vec<String> {
        list_methods_of(&Value::Object(self.object.clone()))
            .methods()
            .map(<[String]>::to_vec)
            .unwrap_or_default()
    }

    fn call(&self, method: &str, args: &[Value]) -> Result<Value, ObjectError> {
        self.object.invoke(method, args)
    }
}

struct Component {
    namespace: String,
    exposed: Vec<String>,
    capability: Box<dyn Capability>,
}

pub struct HostAssembly {
    strategy: MergeStrategy,
    components: Vec<Component>,
}

impl Default for HostAssembly {
    fn default() -> Self {
        Self::new()
    }
}

impl HostAssembly {
    pub fn new() -> Self {
        HostAssembly { strategy: MergeStrategy::ErrorOnConflict, components: Vec::new() }
    }

    /// Policy for flat routes; defaults to `error-on-conflict`.
    pub fn strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with(mut self, namespace: &str, capability: impl Capability + 'static) -> Result<Self, ObjectError> {
        if self.components.iter().any(|c| c.namespace == namespace) {
            return Err(ObjectError::Conflict { key: namespace.to_string() });
        }
        self.components.push(Component {
            namespace: namespace.to_string(),
            exposed: capability.exposed(),
            capability: Box::new(capability),
        });
        Ok(self)
    }

    pub fn assemble(self) -> Result<CapabilityHost, ObjectError> {
        let mut routes: HashMap<String, usize> = HashMap::new();
        if self.strategy != MergeStrategy::NamespacedOnly {
            for (index, component) in self.components.iter().enumerate() {
                for method in &component.exposed {
                    match (routes.get(method), self.strategy) {
                        (None, _) | (Some(_), MergeStrategy::LastWins) => {
                            routes.insert(method.clone(), index);
                        }
                        (Some(_), MergeStrategy::FirstWins) => {}
                        (Some(_), _) => return Err(ObjectError::Conflict { key: method.clone() }),
                    }
                }
            }
        }
        debug!(
            "assembled capability host: {} component(s), {} flat route(s), strategy={}",
            self.components.len(),
            routes.len(),
            self.strategy
        );
        Ok(CapabilityHost { strategy: self.strategy, components: self.components, routes })
    }
}

pub struct CapabilityHost {
    strategy: MergeStrategy,
    components: Vec<Component>,
    routes: HashMap<String, usize>,
}

impl CapabilityHost {
    pub fn strategy(&self) -> MergeStrategy {
        self.strategy
    }

    pub fn namespaces(&self) -> Vec<&str> {
        self.components.iter().map(|c| c.namespace.as_str()).collect()
    }

    pub fn component(&self, namespace: &str) -> Option<&dyn Capability> {
        self.components
            .iter()
            .find(|c| c.namespace == namespace)
            .map(|c| c.capability.as_ref())
    }

    /// Namespace serving `method` on the flat route, if any.
    pub fn route(&self, method: &str) -> Option<&str> {
        self.routes.get(method).map(|&index| self.components[index].namespace.as_str())
    }

    /// `host.<namespace>.<method>(...)`.
    pub fn delegate(&self, namespace: &str, method: &str, args: &[Value]) -> Result<Value, ObjectError> {
        let component = self
            .components
            .iter()
            .find(|c| c.namespace == namespace)
            .ok_or_else(|| ObjectError::NotFound(namespace.to_string()))?;
        if !component.exposed.iter().any(|m| m == method) {
            return Err(ObjectError::NotFound(format!("{}.{}", namespace, method)));
        }
        component.capability.call(method, args)
    }

    /// `host.<method>(...)` through the flat route table.
    pub fn call(&self, method: &str, args: &[Value]) -> Result<Value, ObjectError> {
        let index = *self.routes.get(method).ok_or_else(|| ObjectError::NotFound(method.to_string()))?;
        self.components[index].capability.call(method, args)
    }
}

impl fmt::Debug for CapabilityHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityHost")
            .field("strategy", &self.strategy)
            .field("namespaces", &self.namespaces())
            .field("routes", &self.routes.len())
            .finish()
    }
}
