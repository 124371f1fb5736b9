//! Configurable conflict policy for composition.

use std::collections::HashSet;

use log::debug;
use serde::Deserialize;
use strum_macros::{Display, EnumString};

use crate::config::ComposerConfig;
use crate::error::ObjectError;
use crate::mixin::{self, compose_trace};
use crate::objects::object::ObjectRef;
use crate::objects::object_class::ObjectClass;
use crate::value::Value;

/// What happens when a composed property name is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumString, Display, Deserialize)]
#[strum(serialize_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Later writes replace earlier ones, like `Object.assign`.
    #[default]
    LastWins,
    /// Names the target already owns are left alone.
    FirstWins,
    /// Any collision fails the whole call before anything is written.
    ErrorOnConflict,
    /// Only namespaced composition is allowed.
    NamespacedOnly,
}

/// Composition with an explicit [`MergeStrategy`].
#[derive(Debug, Clone)]
pub struct Composer {
    strategy: MergeStrategy,
    reserved_names: HashSet<String>,
}

impl Default for Composer {
    fn default() -> Self {
        Composer::from_config(ComposerConfig::global())
    }
}

impl Composer {
    pub fn new(strategy: MergeStrategy) -> Self {
        Composer { strategy, reserved_names: HashSet::new() }
    }

    pub fn from_config(config: &ComposerConfig) -> Self {
        Composer {
            strategy: config.strategy,
            reserved_names: config.reserved_names.iter().cloned().collect(),
        }
    }

    pub fn strategy(&self) -> MergeStrategy {
        self.strategy
    }

    /// Registers `class`'s prototype methods on `target`, skipping the configured
    /// reserved names as well as `constructor`.
    pub fn make_mixable(&self, target: &ObjectRef, class: &ObjectClass) -> usize {
        mixin::register_methods(target, class, |name| self.reserved_names.contains(name))
    }

    /// Flat composition of `sources` onto `target`. Returns `target`.
    pub fn compose(&self, target: &Value, sources: &[Value]) -> Result<Value, ObjectError> {
        if self.strategy == MergeStrategy::NamespacedOnly {
            return Err(ObjectError::NamespaceRequired { strategy: self.strategy });
        }
        let object = mixin::target_object(target)?;
        if self.strategy == MergeStrategy::LastWins {
            return mixin::mixin(target, sources);
        }

        let plan = self.plan(object, sources)?;
        let written = plan.len();
        for (key, value) in plan {
            compose_trace!("{} compose {} <- {}", self.strategy, key, value);
            object.set(key, value)?;
        }
        object.note_composed();
        debug!("compose ({}): {} propert(ies) written", self.strategy, written);
        Ok(target.clone())
    }

    /// The writes a flat composition performs, after applying the strategy.
    fn plan(&self, object: &ObjectRef, sources: &[Value]) -> Result<Vec<(String, Value)>, ObjectError> {
        let mut claimed: HashSet<String> = HashSet::new();
        let mut plan = Vec::new();
        for source in sources {
            for (key, value) in mixin::source_entries(source)? {
                let taken = claimed.contains(&key) || object.has_own(key.as_str());
                match self.strategy {
                    MergeStrategy::FirstWins if taken => continue,
                    MergeStrategy::ErrorOnConflict if taken => return Err(ObjectError::Conflict { key }),
                    _ => {}
                }
                claimed.insert(key.clone());
                plan.push((key, value));
            }
        }
        Ok(plan)
    }

    /// `host.<namespace> = {}` then compose into it. Returns the namespace object.
    pub fn compose_namespaced(
        &self,
        host: &ObjectRef,
        namespace: &str,
        sources: &[Value],
    ) -> Result<ObjectRef, ObjectError> {
        if host.has_own(namespace) {
            match self.strategy {
                MergeStrategy::LastWins => {}
                MergeStrategy::FirstWins => {
                    let existing = host.get(namespace);
                    return match existing.as_object() {
                        Some(space) => {
                            Composer::new(MergeStrategy::FirstWins).compose(&existing, sources)?;
                            host.note_composed();
                            Ok(space.clone())
                        }
                        None => Err(ObjectError::type_error(format!(
                            "namespace '{}' is taken by a {} value",
                            namespace,
                            existing.value_type()
                        ))),
                    };
                }
                MergeStrategy::ErrorOnConflict | MergeStrategy::NamespacedOnly => {
                    return Err(ObjectError::Conflict { key: namespace.to_string() });
                }
            }
        }

        let space = ObjectRef::new_plain();
        let inner = match self.strategy {
            MergeStrategy::NamespacedOnly => Composer::new(MergeStrategy::ErrorOnConflict),
            strategy => Composer::new(strategy),
        };
        inner.compose(&Value::Object(space.clone()), sources)?;
        host.set(namespace, Value::Object(space.clone()))?;
        host.note_composed();
        Ok(space)
    }
}
