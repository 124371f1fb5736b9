use std::fmt;
use std::rc::Rc;

use strum_macros::{Display, EnumString};

use crate::objects::object::ObjectRef;
use crate::objects::object_class::ObjectClass;
use crate::objects::object_native_function::ObjectNativeFunction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ValueType {
    Undefined,
    Null,
    Boolean,
    Number,
    String,
    Symbol,
    Function,
    Class,
    Object,
}

/// Unique symbol identifier. Symbol-keyed properties never take part in composition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

#[derive(Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Symbol(SymbolId),
    Function(Rc<ObjectNativeFunction>),
    Class(Rc<ObjectClass>),
    Object(ObjectRef),
}

impl Default for Value {
    fn default() -> Self {
        Value::Undefined
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Undefined => ValueType::Undefined,
            Value::Null => ValueType::Null,
            Value::Bool(_) => ValueType::Boolean,
            Value::Number(_) => ValueType::Number,
            Value::String(_) => ValueType::String,
            Value::Symbol(_) => ValueType::Symbol,
            Value::Function(_) => ValueType::Function,
            Value::Class(_) => ValueType::Class,
            Value::Object(_) => ValueType::Object,
        }
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_class(&self) -> Option<&Rc<ObjectClass>> {
        match self {
            Value::Class(class) => Some(class),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Rc<ObjectNativeFunction>> {
        match self {
            Value::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }
}

#[inline(always)]
pub fn is_undefined(value: &Value) -> bool {
    matches!(value, Value::Undefined)
}

/// `undefined` or `null`.
#[inline(always)]
pub fn is_nullish(value: &Value) -> bool {
    matches!(value, Value::Undefined | Value::Null)
}

/// Functions and classes are both callable.
#[inline(always)]
pub fn is_callable(value: &Value) -> bool {
    matches!(value, Value::Function(_) | Value::Class(_))
}

#[inline(always)]
pub fn make_number_value(value: f64) -> Value {
    Value::Number(value)
}

#[inline(always)]
pub fn make_bool_value(value: bool) -> Value {
    Value::Bool(value)
}

pub fn make_string_value(value: &str) -> Value {
    Value::String(Rc::from(value))
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        make_string_value(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(Rc::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

impl From<Rc<ObjectClass>> for Value {
    fn from(value: Rc<ObjectClass>) -> Self {
        Value::Class(value)
    }
}

impl From<Rc<ObjectNativeFunction>> for Value {
    fn from(value: Rc<ObjectNativeFunction>) -> Self {
        Value::Function(value)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

fn format_number(number: f64) -> String {
    if number.is_nan() {
        return "NaN".to_string();
    }
    if number.is_infinite() {
        return if number > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if number == 0.0 {
        return "0".to_string();
    }
    let magnitude = number.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        // Shortest round-trip digits, exponent written as `e+21` / `e-7`.
        let formatted = format!("{:e}", number);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{}e+{}", mantissa, exponent),
            _ => formatted,
        };
    }
    format!("{}", number)
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => write!(f, "undefined"),
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", format_number(*n)),
            Value::String(s) => write!(f, "{}", s),
            Value::Symbol(id) => write!(f, "Symbol({})", id.0),
            Value::Function(function) => write!(f, "<native fn {}>", function.name()),
            Value::Class(class) => write!(f, "<class {}>", class.name()),
            Value::Object(object) => write!(f, "{}", object),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_formatting() {
        assert_eq!(make_number_value(10.0).to_string(), "10");
        assert_eq!(make_number_value(2.5).to_string(), "2.5");
        assert_eq!(make_number_value(f64::NAN).to_string(), "NaN");
        assert_eq!(make_number_value(-0.0).to_string(), "0");
        assert_eq!(make_number_value(1e20).to_string(), "100000000000000000000");
        assert_eq!(make_number_value(-9.5e18).to_string(), "-9500000000000000000");
        assert_eq!(make_number_value(1e21).to_string(), "1e+21");
        assert_eq!(make_number_value(1.5e300).to_string(), "1.5e+300");
        assert_eq!(make_number_value(1e-12).to_string(), "1e-12");
        assert_eq!(make_number_value(0.000001).to_string(), "0.000001");
        assert_eq!(make_number_value(0.1 + 0.2).to_string(), "0.30000000000000004");
    }

    #[test]
    fn test_value_type_names() {
        assert_eq!(Value::Undefined.value_type().to_string(), "undefined");
        assert_eq!(make_bool_value(true).value_type().to_string(), "boolean");
        assert_eq!("object".parse::<ValueType>(), Ok(ValueType::Object));
    }

    #[test]
    fn test_nullish_and_callable() {
        assert!(is_nullish(&Value::Null));
        assert!(is_nullish(&Value::Undefined));
        assert!(!is_nullish(&make_number_value(0.0)));
        assert!(!is_callable(&make_string_value("f")));
    }

    #[test]
    fn test_string_equality_is_by_content() {
        assert_eq!(make_string_value("host"), Value::from("host".to_string()));
        assert_ne!(make_string_value("host"), make_string_value("donor"));
    }
}
