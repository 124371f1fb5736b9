use std::fmt;
use std::rc::Rc;

use crate::error::ObjectError;
use crate::objects::object::NativeObject;
use crate::value::Value;

/// A callable value. `arity` is informational, like a function's `length`;
/// calls with fewer arguments see `undefined` for the missing ones.
pub struct ObjectNativeFunction {
    name: String,
    arity: u8,
    native_object: Box<dyn NativeObject>,
}

impl ObjectNativeFunction {
    pub fn new(name: impl Into<String>, arity: u8, native_object: impl NativeObject + 'static) -> Self {
        ObjectNativeFunction {
            name: name.into(),
            arity,
            native_object: Box::new(native_object),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn arity(&self) -> u8 {
        self.arity
    }

    /// Calls the function with `this` bound to `receiver`.
    pub fn invoke(&self, receiver: &Value, args: &[Value]) -> Result<Value, ObjectError> {
        self.native_object.run(receiver, args).map_err(ObjectError::Native)
    }
}

impl fmt::Debug for ObjectNativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}/{}>", self.name, self.arity)
    }
}

/// Wraps a closure as a function value.
pub fn make_native_function_value(
    name: impl Into<String>,
    arity: u8,
    body: impl Fn(&Value, &[Value]) -> Result<Value, String> + 'static,
) -> Value {
    Value::Function(Rc::new(ObjectNativeFunction::new(name, arity, body)))
}

/// Argument `index`, or `undefined` when the caller passed fewer.
pub fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}
