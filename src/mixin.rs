//! The mixin pattern: register a class's methods on an instance, copy own
//! properties between objects, and list the methods an object carries.

use std::fmt;

use log::{debug, warn};
use phf::phf_set;

use crate::error::ObjectError;
use crate::objects::object::ObjectRef;
use crate::objects::object_class::ObjectClass;
use crate::value::{is_callable, is_undefined, Value};

/// Prototype names the registrar never copies.
static RESERVED_PROTOTYPE_KEYS: phf::Set<&'static str> = phf_set! {
    "constructor",
};

// Per-property tracing, compiled in with the `debug_trace_composition` feature only.
#[cfg(feature = "debug_trace_composition")]
macro_rules! compose_trace { ($($arg:tt)*) => { log::trace!("[compose-trace] {}", format_args!($($arg)*)); } }
#[cfg(not(feature = "debug_trace_composition"))]
macro_rules! compose_trace { ($($arg:tt)*) => { } }
pub(crate) use compose_trace;

pub fn is_reserved_prototype_key(name: &str) -> bool {
    RESERVED_PROTOTYPE_KEYS.contains(name)
}

/// `makeMixable(ctx, className)`.
///
/// Copies every prototype method of `class` (except `constructor`) onto `ctx`
/// as an enumerable own property, so a later [`mixin`] of `ctx` carries them
/// along. Never fails: a non-object `ctx` or a non-class `class` is a no-op.
pub fn make_mixable(ctx: &Value, class: &Value) {
    match (ctx.as_object(), class.as_class()) {
        (Some(target), Some(class)) => make_mixable_class(target, class),
        _ => debug!(
            "make_mixable: nothing to register ({} onto {})",
            class.value_type(),
            ctx.value_type()
        ),
    }
}

pub fn make_mixable_class(target: &ObjectRef, class: &ObjectClass) {
    register_methods(target, class, |_| false);
}

/// Returns how many methods were written.
pub(crate) fn register_methods(target: &ObjectRef, class: &ObjectClass, skip: impl Fn(&str) -> bool) -> usize {
    let mut registered = 0;
    for key in class.prototype_keys() {
        let Some(name) = key.as_str() else {
            continue;
        };
        if is_reserved_prototype_key(name) || skip(name) {
            continue;
        }
        let Some(method) = class.prototype_get(name) else {
            continue;
        };
        match target.set(name, method) {
            Ok(()) => {
                compose_trace!("register {}.{}", class.name(), name);
                registered += 1;
            }
            Err(error) => warn!("make_mixable: skipped {}.{}: {}", class.name(), name, error),
        }
    }
    debug!("make_mixable: registered {} method(s) of {}", registered, class.name());
    registered
}

pub(crate) fn target_object(target: &Value) -> Result<&ObjectRef, ObjectError> {
    match target {
        Value::Object(object) => Ok(object),
        Value::Undefined | Value::Null => Err(ObjectError::type_error("Cannot convert undefined or null to object")),
        other => Err(ObjectError::type_error(format!(
            "Cannot assign properties onto a {} value",
            other.value_type()
        ))),
    }
}

/// What a source contributes to a composition: its own enumerable string-keyed
/// properties, in own-key order.
///
/// A string source spreads one index key per `char`. Strings hold UTF-8, so an
/// astral character such as `"😀"` stays whole under one key instead of
/// splitting into two lone UTF-16 surrogates.
pub(crate) fn source_entries(source: &Value) -> Result<Vec<(String, Value)>, ObjectError> {
    match source {
        Value::Object(object) => object.own_enumerable_entries(),
        Value::String(s) => Ok(s
            .chars()
            .enumerate()
            .map(|(index, c)| (index.to_string(), Value::from(c.to_string())))
            .collect()),
        _ => Ok(Vec::new()),
    }
}

/// `Mixin(target, ...sources)`: shallow, last-write-wins copy of every source's
/// own enumerable properties onto `target`. Returns `target` itself.
///
/// Each source is snapshotted before any write, so a source may alias the target.
/// A failing write aborts the call; earlier writes stay.
pub fn mixin(target: &Value, sources: &[Value]) -> Result<Value, ObjectError> {
    let object = target_object(target)?;
    let mut written = 0;
    for source in sources {
        for (key, value) in source_entries(source)? {
            compose_trace!("mixin {} <- {}", key, value);
            object.set(key, value)?;
            written += 1;
        }
    }
    object.note_composed();
    debug!("mixin: {} source(s), {} propert(ies) written", sources.len(), written);
    Ok(target.clone())
}

/// `Mixin(host.<namespace> = {}, ...sources)`. Returns the namespace object.
pub fn mixin_namespaced(host: &ObjectRef, namespace: &str, sources: &[Value]) -> Result<ObjectRef, ObjectError> {
    let space = ObjectRef::new_plain();
    host.set(namespace, Value::Object(space.clone()))?;
    mixin(&Value::Object(space.clone()), sources)?;
    host.note_composed();
    Ok(space)
}

/// Result of [`list_methods_of`]: the method names, or a description of why
/// there are none to list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodListing {
    Methods(Vec<String>),
    Diagnostic(String),
}

impl MethodListing {
    pub fn methods(&self) -> Option<&[String]> {
        match self {
            MethodListing::Methods(names) => Some(names),
            MethodListing::Diagnostic(_) => None,
        }
    }

    pub fn diagnostic(&self) -> Option<&str> {
        match self {
            MethodListing::Methods(_) => None,
            MethodListing::Diagnostic(message) => Some(message),
        }
    }

    pub fn is_methods(&self) -> bool {
        matches!(self, MethodListing::Methods(_))
    }
}

impl fmt::Display for MethodListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodListing::Methods(names) => write!(f, "[{}]", names.join(", ")),
            MethodListing::Diagnostic(message) => write!(f, "{}", message),
        }
    }
}

/// `listMethodsOf(obj)`: own property names (enumerable or not) holding callables.
pub fn list_methods_of(value: &Value) -> MethodListing {
    let absent = format!("The variable {} passed to list_methods_of() was undefined or not set", value);
    if is_undefined(value) {
        return MethodListing::Diagnostic(absent);
    }
    match callable_own_names(value) {
        Ok(names) => MethodListing::Methods(names),
        Err(error) => MethodListing::Diagnostic(format!("{}\nThe following error was found: {}", absent, error)),
    }
}

fn callable_own_names(value: &Value) -> Result<Vec<String>, ObjectError> {
    match value {
        Value::Null => Err(ObjectError::type_error("Cannot convert undefined or null to object")),
        Value::Object(object) => Ok(object
            .own_keys()?
            .into_iter()
            .filter_map(|key| key.as_str().map(str::to_string))
            .filter(|name| object.get_own(name.as_str()).is_some_and(|value| is_callable(&value)))
            .collect()),
        _ => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::object_class::ClassBuilder;
    use crate::objects::object_native_function::make_native_function_value;
    use crate::table::Property;
    use crate::value::{make_number_value, make_string_value, SymbolId};

    fn number(n: f64) -> Value {
        make_number_value(n)
    }

    #[test]
    fn test_reserved_keys() {
        assert!(is_reserved_prototype_key("constructor"));
        assert!(!is_reserved_prototype_key("beep"));
    }

    #[test]
    fn test_make_mixable_binds_donor_methods() {
        let probe = ClassBuilder::new("NanoProbe")
            .method("beep", 0, |_this, _args| Ok("boop".into()))
            .method("logCellActivity", 1, |_this, _args| Ok(Value::Undefined))
            .build();
        let target = ObjectRef::new_plain();

        make_mixable(&Value::Object(target.clone()), &Value::Class(probe.clone()));

        let names: Vec<String> = target.own_keys().unwrap().iter().map(|k| k.to_string()).collect();
        assert_eq!(names, vec!["beep", "logCellActivity"]);
        assert_eq!(target.invoke("beep", &[]), Ok(make_string_value("boop")));
        assert!(target.get_own_property("beep").unwrap().enumerable);
    }

    #[test]
    fn test_make_mixable_with_bad_inputs_is_noop() {
        let target = ObjectRef::new_plain();
        make_mixable(&Value::Object(target.clone()), &Value::Null);
        make_mixable(&Value::Undefined, &Value::Undefined);
        assert!(target.own_keys().unwrap().is_empty());
    }

    #[test]
    fn test_make_mixable_on_frozen_target_does_not_raise() {
        let probe = ClassBuilder::new("NanoProbe").method("beep", 0, |_this, _args| Ok(Value::Undefined)).build();
        let target = ObjectRef::new_plain();
        target.freeze();

        make_mixable_class(&target, &probe);
        assert!(!target.has_own("beep"));
    }

    #[test]
    fn test_mixin_skips_hidden_and_symbol_properties() {
        let source = ObjectRef::from_entries([("a", number(1.0))]);
        source.define("hidden", Property::hidden(number(2.0))).unwrap();
        source.define(SymbolId(3), Property::data(number(3.0))).unwrap();
        let target = ObjectRef::new_plain();

        mixin(&Value::Object(target.clone()), &[Value::Object(source.clone())]).unwrap();

        assert_eq!(target.own_keys().unwrap().len(), 1);
        assert_eq!(target.get("a"), number(1.0));
        assert_eq!(source.own_keys().unwrap().len(), 3);
    }

    #[test]
    fn test_mixin_null_target_is_type_error() {
        let error = mixin(&Value::Null, &[]).unwrap_err();
        assert_eq!(error, ObjectError::TypeError("Cannot convert undefined or null to object".to_string()));
        assert!(mixin(&number(5.0), &[]).is_err());
    }

    #[test]
    fn test_mixin_skips_nullish_sources_and_spreads_strings() {
        let target = ObjectRef::new_plain();
        mixin(&Value::Object(target.clone()), &[Value::Null, Value::Undefined, "ab".into(), number(3.0)]).unwrap();

        assert_eq!(target.get("0"), make_string_value("a"));
        assert_eq!(target.get("1"), make_string_value("b"));
        assert_eq!(target.own_keys().unwrap().len(), 2);
    }

    #[test]
    fn test_string_spread_keeps_astral_characters_whole() {
        let target = ObjectRef::new_plain();
        mixin(&Value::Object(target.clone()), &["😀é".into()]).unwrap();

        assert_eq!(target.get("0"), make_string_value("😀"));
        assert_eq!(target.get("1"), make_string_value("é"));
        assert_eq!(target.own_keys().unwrap().len(), 2);
    }

    #[test]
    fn test_mixin_into_itself() {
        let object = ObjectRef::from_entries([("a", number(1.0))]);
        let value = Value::Object(object.clone());
        assert!(mixin(&value, &[value.clone()]).is_ok());
        assert_eq!(object.get("a"), number(1.0));
    }

    #[test]
    fn test_mixin_stops_at_read_only_property() {
        let target = ObjectRef::from_entries([("b", number(0.0))]);
        target.define("a", Property { value: number(0.0), enumerable: true, writable: false }).unwrap();
        let source = ObjectRef::from_entries([("b", number(1.0)), ("a", number(2.0)), ("c", number(3.0))]);

        let error = mixin(&Value::Object(target.clone()), &[Value::Object(source)]).unwrap_err();

        assert!(matches!(error, ObjectError::TypeError(_)));
        assert_eq!(target.get("b"), number(1.0));
        assert!(!target.has_own("c"));
    }

    #[test]
    fn test_mixin_refused_source_propagates() {
        let source = ObjectRef::new_plain();
        source.refuse_introspection();
        let result = mixin(&Value::Object(ObjectRef::new_plain()), &[Value::Object(source)]);
        assert_eq!(result.unwrap_err(), ObjectError::IntrospectionRefused);
    }

    #[test]
    fn test_list_methods_of_absent_and_null() {
        let absent = list_methods_of(&Value::Undefined);
        assert_eq!(
            absent.diagnostic(),
            Some("The variable undefined passed to list_methods_of() was undefined or not set")
        );

        let null = list_methods_of(&Value::Null);
        let message = null.diagnostic().unwrap();
        assert!(message.starts_with("The variable null passed to list_methods_of()"));
        assert!(message.contains("The following error was found: TypeError"));
    }

    #[test]
    fn test_list_methods_includes_hidden_callables() {
        let object = ObjectRef::from_entries([
            ("f", make_native_function_value("f", 0, |_this, _args| Ok(number(1.0)))),
            ("x", number(2.0)),
        ]);
        object
            .define("g", Property::hidden(make_native_function_value("g", 0, |_this, _args| Ok(Value::Undefined))))
            .unwrap();

        assert_eq!(list_methods_of(&Value::Object(object)), MethodListing::Methods(vec!["f".into(), "g".into()]));
    }

    #[test]
    fn test_list_methods_of_primitives_and_refused() {
        assert_eq!(list_methods_of(&number(1.0)), MethodListing::Methods(vec![]));

        let opaque = ObjectRef::new_plain();
        opaque.refuse_introspection();
        let listing = list_methods_of(&Value::Object(opaque));
        assert!(!listing.is_methods());
        assert!(listing.to_string().contains("refuses own-property introspection"));
    }
}
