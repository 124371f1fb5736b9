use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use strum_macros::Display;

use crate::error::ObjectError;
use crate::objects::object_class::{ObjectClass, PrivateName};
use crate::table::{Property, PropertyKey, Table};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ObjectType {
    ObjPlain,
    ObjInstance,
}

/// Construction progress of an object. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
pub enum InstanceState {
    Uninitialized,
    SuperclassInitialized,
    Composed,
    Ready,
}

/// Body of a native function; `this` is the receiver the function was invoked on.
pub trait NativeObject {
    fn run(&self, this: &Value, args: &[Value]) -> Result<Value, String>;
}

impl<F> NativeObject for F
where
    F: Fn(&Value, &[Value]) -> Result<Value, String>,
{
    fn run(&self, this: &Value, args: &[Value]) -> Result<Value, String> {
        self(this, args)
    }
}

pub struct Object {
    obj_type: ObjectType,
    class: Option<Rc<ObjectClass>>,
    properties: Table,
    private_slots: HashMap<PrivateName, Value>,
    extensible: bool,
    introspectable: bool,
    state: InstanceState,
}

impl Object {
    fn new(obj_type: ObjectType, class: Option<Rc<ObjectClass>>, state: InstanceState) -> Self {
        Object {
            obj_type,
            class,
            properties: Table::new(),
            private_slots: HashMap::new(),
            extensible: true,
            introspectable: true,
            state,
        }
    }
}

/// Shared handle to an object. Cloning the handle aliases the object.
#[derive(Clone)]
pub struct ObjectRef(Rc<RefCell<Object>>);

impl ObjectRef {
    /// An empty object literal.
    pub fn new_plain() -> Self {
        ObjectRef(Rc::new(RefCell::new(Object::new(ObjectType::ObjPlain, None, InstanceState::Ready))))
    }

    /// An object literal with the given properties, in order.
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<PropertyKey>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let object = Self::new_plain();
        {
            let mut inner = object.0.borrow_mut();
            for (key, value) in entries {
                inner.properties.insert(key.into(), Property::data(value));
            }
        }
        object
    }

    pub(crate) fn new_instance(class: Rc<ObjectClass>) -> Self {
        ObjectRef(Rc::new(RefCell::new(Object::new(
            ObjectType::ObjInstance,
            Some(class),
            InstanceState::Uninitialized,
        ))))
    }

    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn object_type(&self) -> ObjectType {
        self.0.borrow().obj_type
    }

    pub fn class(&self) -> Option<Rc<ObjectClass>> {
        self.0.borrow().class.clone()
    }

    pub fn state(&self) -> InstanceState {
        self.0.borrow().state
    }

    pub(crate) fn advance_state(&self, next: InstanceState) {
        let mut inner = self.0.borrow_mut();
        if next > inner.state {
            inner.state = next;
        }
    }

    /// Records that donor properties were merged in while the object is still
    /// being constructed.
    pub(crate) fn note_composed(&self) {
        let mut inner = self.0.borrow_mut();
        if inner.state == InstanceState::SuperclassInitialized {
            inner.state = InstanceState::Composed;
        }
    }

    pub fn get_own(&self, key: impl Into<PropertyKey>) -> Option<Value> {
        self.0.borrow().properties.find(&key.into()).map(|p| p.value.clone())
    }

    pub fn get_own_property(&self, key: impl Into<PropertyKey>) -> Option<Property> {
        self.0.borrow().properties.find(&key.into()).cloned()
    }

    pub fn has_own(&self, key: impl Into<PropertyKey>) -> bool {
        self.0.borrow().properties.contains(&key.into())
    }

    /// Property read: own properties first, then the class prototype chain.
    pub fn get(&self, key: impl Into<PropertyKey>) -> Value {
        let key = key.into();
        let class = {
            let inner = self.0.borrow();
            if let Some(property) = inner.properties.find(&key) {
                return property.value.clone();
            }
            inner.class.clone()
        };
        match (class, key.as_str()) {
            (Some(class), Some(name)) => class.lookup(name).unwrap_or_default(),
            _ => Value::Undefined,
        }
    }

    /// Assignment: overwrites in place or appends an enumerable, writable property.
    pub fn set(&self, key: impl Into<PropertyKey>, value: Value) -> Result<(), ObjectError> {
        let key = key.into();
        let mut inner = self.0.borrow_mut();
        if let Some(existing) = inner.properties.find_mut(&key) {
            if !existing.writable {
                return Err(ObjectError::type_error(format!(
                    "Cannot assign to read only property '{}' of object",
                    key
                )));
            }
            existing.value = value;
            return Ok(());
        }
        if !inner.extensible {
            return Err(ObjectError::type_error(format!(
                "Cannot add property {}, object is not extensible",
                key
            )));
        }
        inner.properties.insert(key, Property::data(value));
        Ok(())
    }

    /// Defines a property with explicit attributes, replacing any previous one.
    /// A read-only property of a non-extensible object cannot be replaced.
    pub fn define(&self, key: impl Into<PropertyKey>, property: Property) -> Result<(), ObjectError> {
        let key = key.into();
        let mut inner = self.0.borrow_mut();
        if !inner.extensible {
            match inner.properties.find(&key) {
                None => {
                    return Err(ObjectError::type_error(format!(
                        "Cannot define property {}, object is not extensible",
                        key
                    )))
                }
                Some(existing) if !existing.writable => {
                    return Err(ObjectError::type_error(format!("Cannot redefine property: {}", key)))
                }
                Some(_) => {}
            }
        }
        inner.properties.insert(key, property);
        Ok(())
    }

    /// Returns false when the object is frozen.
    pub fn delete(&self, key: impl Into<PropertyKey>) -> bool {
        let key = key.into();
        let mut inner = self.0.borrow_mut();
        let locked = match inner.properties.find(&key) {
            None => return true,
            Some(property) => !property.writable && !inner.extensible,
        };
        if locked {
            return false;
        }
        inner.properties.remove(&key).is_some()
    }

    pub fn own_keys(&self) -> Result<Vec<PropertyKey>, ObjectError> {
        let inner = self.0.borrow();
        if !inner.introspectable {
            return Err(ObjectError::IntrospectionRefused);
        }
        Ok(inner.properties.keys())
    }

    /// Snapshot of the own enumerable string-keyed properties, in own-key order.
    pub fn own_enumerable_entries(&self) -> Result<Vec<(String, Value)>, ObjectError> {
        let inner = self.0.borrow();
        if !inner.introspectable {
            return Err(ObjectError::IntrospectionRefused);
        }
        Ok(inner
            .properties
            .iter()
            .filter(|(_, property)| property.enumerable)
            .filter_map(|(key, property)| match key {
                PropertyKey::String(name) => Some((name, property.value.clone())),
                PropertyKey::Symbol(_) => None,
            })
            .collect())
    }

    /// Calls the method found under `name` with `this` bound to this object.
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Value, ObjectError> {
        match self.get(name) {
            Value::Function(function) => function.invoke(&Value::Object(self.clone()), args),
            Value::Class(class) => Err(ObjectError::type_error(format!(
                "Class constructor {} cannot be invoked without 'new'",
                class.name()
            ))),
            _ => Err(ObjectError::type_error(format!("this.{} is not a function", name))),
        }
    }

    pub fn prevent_extensions(&self) {
        self.0.borrow_mut().extensible = false;
    }

    pub fn is_extensible(&self) -> bool {
        self.0.borrow().extensible
    }

    /// Makes every own property read-only and forbids new ones.
    pub fn freeze(&self) {
        let mut inner = self.0.borrow_mut();
        inner.extensible = false;
        for key in inner.properties.keys() {
            if let Some(property) = inner.properties.find_mut(&key) {
                property.writable = false;
            }
        }
    }

    pub fn is_frozen(&self) -> bool {
        let inner = self.0.borrow();
        let frozen = !inner.extensible && inner.properties.iter().all(|(_, property)| !property.writable);
        frozen
    }

    /// After this call every own-key enumeration fails.
    pub fn refuse_introspection(&self) {
        self.0.borrow_mut().introspectable = false;
    }

    pub(crate) fn private_init(&self, name: &PrivateName, value: Value) {
        self.0.borrow_mut().private_slots.insert(name.clone(), value);
    }

    pub(crate) fn private_get(&self, name: &PrivateName) -> Option<Value> {
        self.0.borrow().private_slots.get(name).cloned()
    }

    pub(crate) fn private_set(&self, name: &PrivateName, value: Value) -> bool {
        match self.0.borrow_mut().private_slots.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    #[cfg_attr(not(feature = "debug_print_objects"), allow(dead_code))]
    pub(crate) fn private_len(&self) -> usize {
        self.0.borrow().private_slots.len()
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[object Object]")
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        let name = inner.class.as_ref().map(|c| c.name().to_string()).unwrap_or_else(|| "Object".to_string());
        write!(f, "<{} {} ({} own)>", name, inner.state, inner.properties.len())
    }
}
