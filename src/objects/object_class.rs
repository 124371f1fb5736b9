use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, warn};

use crate::error::ObjectError;
use crate::mixin;
use crate::objects::object::{InstanceState, ObjectRef};
use crate::objects::object_native_function::make_native_function_value;
use crate::table::{Property, PropertyKey, Table};
use crate::value::Value;

pub const CONSTRUCTOR_KEY: &str = "constructor";

static NEXT_CLASS_ID: AtomicU64 = AtomicU64::new(1);

/// Brand for one private field of one class.
///
/// Only the [`ClassBuilder`] that declared the field hands these out, so only code
/// holding the token can reach the slot. Private slots never appear among an
/// object's own properties.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrivateName {
    class_id: u64,
    name: Rc<str>,
}

impl PrivateName {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, object: &ObjectRef) -> Result<Value, ObjectError> {
        object.private_get(self).ok_or_else(|| {
            ObjectError::type_error(format!(
                "Cannot read private member {} from an object whose class did not declare it",
                self.name
            ))
        })
    }

    pub fn set(&self, object: &ObjectRef, value: Value) -> Result<(), ObjectError> {
        if object.private_set(self, value) {
            Ok(())
        } else {
            Err(ObjectError::type_error(format!(
                "Cannot write private member {} to an object whose class did not declare it",
                self.name
            )))
        }
    }
}

#[derive(Clone)]
pub enum FieldInit {
    Value(Value),
    /// Evaluated against the instance being constructed.
    Computed(Rc<dyn Fn(&ObjectRef) -> Value>),
}

impl FieldInit {
    fn evaluate(&self, this: &ObjectRef) -> Value {
        match self {
            FieldInit::Value(value) => value.clone(),
            FieldInit::Computed(init) => init(this),
        }
    }
}

#[derive(Clone)]
enum FieldSlot {
    Public(String),
    Private(PrivateName),
}

type ConstructorFn = Rc<dyn Fn(&mut Construction) -> Result<(), ObjectError>>;

/// A class definition: prototype methods, field initializers, an optional
/// constructor body and at most one superclass.
pub struct ObjectClass {
    id: u64,
    name: String,
    superclass: Option<Rc<ObjectClass>>,
    prototype: Table,
    fields: Vec<(FieldSlot, FieldInit)>,
    constructor: Option<ConstructorFn>,
    self_ref: Weak<ObjectClass>,
}

impl ObjectClass {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn superclass(&self) -> Option<&Rc<ObjectClass>> {
        self.superclass.as_ref()
    }

    /// Own names of the prototype, `constructor` first.
    pub fn prototype_keys(&self) -> Vec<PropertyKey> {
        let mut keys = vec![PropertyKey::from(CONSTRUCTOR_KEY)];
        keys.extend(self.prototype.keys());
        keys
    }

    /// Own prototype entry, without walking to the superclass.
    pub fn prototype_get(&self, name: &str) -> Option<Value> {
        if name == CONSTRUCTOR_KEY {
            return self.self_ref.upgrade().map(Value::Class);
        }
        self.prototype.find(&PropertyKey::from(name)).map(|p| p.value.clone())
    }

    /// Prototype chain lookup.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut class = Some(self);
        while let Some(current) = class {
            if let Some(value) = current.prototype_get(name) {
                return Some(value);
            }
            class = current.superclass.as_deref();
        }
        None
    }

    pub fn is_same(&self, other: &ObjectClass) -> bool {
        self.id == other.id
    }

    /// `new Class(...args)`.
    pub fn construct(self: &Rc<Self>, args: &[Value]) -> Result<ObjectRef, ObjectError> {
        debug!("constructing {} with {} argument(s)", self.name, args.len());
        let this = ObjectRef::new_instance(self.clone());
        self.initialize(&this, args)?;
        this.advance_state(InstanceState::Ready);
        Ok(this)
    }

    fn initialize(self: &Rc<Self>, this: &ObjectRef, args: &[Value]) -> Result<(), ObjectError> {
        if self.superclass.is_none() {
            this.advance_state(InstanceState::SuperclassInitialized);
            self.init_fields(this)?;
        }

        let Some(body) = &self.constructor else {
            // Implicit constructor: forward everything to the superclass.
            if let Some(superclass) = &self.superclass {
                superclass.initialize(this, args)?;
                this.advance_state(InstanceState::SuperclassInitialized);
                self.init_fields(this)?;
            }
            return Ok(());
        };

        let mut construction = Construction {
            class: self.clone(),
            this: this.clone(),
            args: args.to_vec(),
            super_called: self.superclass.is_none(),
        };
        body(&mut construction)?;
        if !construction.super_called {
            return Err(ObjectError::type_error(
                "Must call super constructor in derived class before returning from derived constructor",
            ));
        }
        Ok(())
    }

    /// Fails when a superclass constructor already locked `this` down.
    fn init_fields(&self, this: &ObjectRef) -> Result<(), ObjectError> {
        for (slot, init) in &self.fields {
            let value = init.evaluate(this);
            match slot {
                FieldSlot::Public(name) => this.define(name.as_str(), Property::data(value))?,
                FieldSlot::Private(name) => this.private_init(name, value),
            }
        }
        Ok(())
    }
}

impl fmt::Debug for ObjectClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.superclass {
            Some(superclass) => write!(f, "<class {} extends {}>", self.name, superclass.name),
            None => write!(f, "<class {}>", self.name),
        }
    }
}

pub struct ClassBuilder {
    id: u64,
    name: String,
    superclass: Option<Rc<ObjectClass>>,
    prototype: Table,
    fields: Vec<(FieldSlot, FieldInit)>,
    constructor: Option<ConstructorFn>,
}

impl ClassBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        ClassBuilder {
            id: NEXT_CLASS_ID.fetch_add(1, Ordering::Relaxed),
            name: name.into(),
            superclass: None,
            prototype: Table::new(),
            fields: Vec::new(),
            constructor: None,
        }
    }

    pub fn extends(mut self, superclass: &Rc<ObjectClass>) -> Self {
        self.superclass = Some(superclass.clone());
        self
    }

    /// Prototype method. Like class methods, it is not enumerable.
    pub fn method(
        mut self,
        name: &str,
        arity: u8,
        body: impl Fn(&Value, &[Value]) -> Result<Value, String> + 'static,
    ) -> Self {
        if name == CONSTRUCTOR_KEY {
            warn!("class {}: 'constructor' cannot be declared as a method, use ClassBuilder::constructor", self.name);
            return self;
        }
        let function = make_native_function_value(name, arity, body);
        self.prototype.insert(PropertyKey::from(name), Property::hidden(function));
        self
    }

    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.push((FieldSlot::Public(name.to_string()), FieldInit::Value(value.into())));
        self
    }

    pub fn field_with(mut self, name: &str, init: impl Fn(&ObjectRef) -> Value + 'static) -> Self {
        self.fields.push((FieldSlot::Public(name.to_string()), FieldInit::Computed(Rc::new(init))));
        self
    }

    pub fn declare_private(&mut self, name: &str, value: impl Into<Value>) -> PrivateName {
        self.push_private(name, FieldInit::Value(value.into()))
    }

    pub fn declare_private_with(&mut self, name: &str, init: impl Fn(&ObjectRef) -> Value + 'static) -> PrivateName {
        self.push_private(name, FieldInit::Computed(Rc::new(init)))
    }

    fn push_private(&mut self, name: &str, init: FieldInit) -> PrivateName {
        let name = if name.starts_with('#') { name.to_string() } else { format!("#{name}") };
        let private_name = PrivateName { class_id: self.id, name: Rc::from(name) };
        self.fields.push((FieldSlot::Private(private_name.clone()), init));
        private_name
    }

    pub fn constructor(mut self, body: impl Fn(&mut Construction) -> Result<(), ObjectError> + 'static) -> Self {
        self.constructor = Some(Rc::new(body));
        self
    }

    pub fn build(self) -> Rc<ObjectClass> {
        Rc::new_cyclic(|self_ref| ObjectClass {
            id: self.id,
            name: self.name,
            superclass: self.superclass,
            prototype: self.prototype,
            fields: self.fields,
            constructor: self.constructor,
            self_ref: self_ref.clone(),
        })
    }
}

/// The context a constructor body runs in.
pub struct Construction {
    class: Rc<ObjectClass>,
    this: ObjectRef,
    args: Vec<Value>,
    super_called: bool,
}

impl Construction {
    /// The class whose constructor body is running, not the most derived one.
    pub fn class(&self) -> &Rc<ObjectClass> {
        &self.class
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    pub fn arg(&self, index: usize) -> Value {
        self.args.get(index).cloned().unwrap_or_default()
    }

    pub fn this(&self) -> Result<ObjectRef, ObjectError> {
        if !self.super_called {
            return Err(ObjectError::type_error(
                "Must call super constructor in derived class before accessing 'this'",
            ));
        }
        Ok(self.this.clone())
    }

    /// `super(...args)`: runs the superclass chain, then this class's field initializers.
    pub fn call_super(&mut self, args: &[Value]) -> Result<(), ObjectError> {
        let Some(superclass) = self.class.superclass.clone() else {
            return Err(ObjectError::type_error(format!(
                "'super' keyword unexpected here: {} has no superclass",
                self.class.name
            )));
        };
        if self.super_called {
            return Err(ObjectError::type_error("Super constructor may only be called once"));
        }
        superclass.initialize(&self.this, args)?;
        self.this.advance_state(InstanceState::SuperclassInitialized);
        self.class.init_fields(&self.this)?;
        self.super_called = true;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Value, ObjectError> {
        Ok(self.this()?.get(key))
    }

    pub fn set(&self, key: &str, value: impl Into<Value>) -> Result<(), ObjectError> {
        self.this()?.set(key, value.into())
    }

    pub fn private_get(&self, name: &PrivateName) -> Result<Value, ObjectError> {
        name.get(&self.this()?)
    }

    pub fn private_set(&self, name: &PrivateName, value: impl Into<Value>) -> Result<(), ObjectError> {
        name.set(&self.this()?, value.into())
    }

    /// `makeMixable(this, ThisClass)`.
    pub fn make_mixable(&self) -> Result<(), ObjectError> {
        mixin::make_mixable_class(&self.this()?, &self.class);
        Ok(())
    }

    /// `Mixin(this, source)`.
    pub fn mixin(&self, source: impl Into<Value>) -> Result<(), ObjectError> {
        let this = self.this()?;
        mixin::mixin(&Value::Object(this), &[source.into()])?;
        Ok(())
    }

    /// `Mixin(this.<namespace> = {}, source)`.
    pub fn mixin_namespaced(&self, namespace: &str, source: impl Into<Value>) -> Result<ObjectRef, ObjectError> {
        mixin::mixin_namespaced(&self.this()?, namespace, &[source.into()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{make_number_value, make_string_value};

    fn eukaryote() -> Rc<ObjectClass> {
        let mut builder = ClassBuilder::new("Eukaryote");
        let private_radius = builder.declare_private_with("privateRadius", |this| this.get("radius"));
        builder
            .field("foo", "Some public property")
            .field_with("probe", move |this| match private_radius.get(this) {
                Ok(Value::Undefined) => make_string_value("no radius yet"),
                Ok(other) => other,
                Err(_) => Value::Null,
            })
            .method("cellImportinTransport", 1, |this, args| {
                let Some(this) = this.as_object() else {
                    return Err("receiver is not an object".to_string());
                };
                let rna = args.first().cloned().unwrap_or_default();
                let nucleus = this.get("nucleus");
                let Some(nucleus) = nucleus.as_object() else {
                    return Ok(Value::Undefined);
                };
                nucleus.set("importedRna", rna.clone()).map_err(|e| e.to_string())?;
                Ok(format!("RNA {} was imported", rna).into())
            })
            .constructor(|ctx| {
                let radius = match ctx.arg(0) {
                    Value::Number(r) => make_number_value(r * 2.0),
                    _ => make_number_value(1.0),
                };
                ctx.set("radius", radius)?;
                ctx.set("hasNucleus", true)?;
                ctx.set("nucleus", ObjectRef::new_plain())?;
                ctx.make_mixable()
            })
            .build()
    }

    #[test]
    fn test_construct_runs_fields_then_body() {
        let class = eukaryote();
        let cell = class.construct(&[make_number_value(5.0)]).unwrap();

        assert_eq!(cell.get("radius"), make_number_value(10.0));
        assert_eq!(cell.get("foo"), make_string_value("Some public property"));
        // Field initializers run before the body assigned radius.
        assert_eq!(cell.get("probe"), make_string_value("no radius yet"));
        assert_eq!(cell.state(), InstanceState::Ready);
        assert!(!cell.has_own("privateRadius"));
        assert!(!cell.has_own("#privateRadius"));
    }

    #[test]
    fn test_method_bound_to_receiver() {
        let cell = eukaryote().construct(&[]).unwrap();
        let result = cell.invoke("cellImportinTransport", &["CAGTA".into()]).unwrap();

        assert_eq!(result, make_string_value("RNA CAGTA was imported"));
        let nucleus = cell.get("nucleus");
        assert_eq!(nucleus.as_object().unwrap().get("importedRna"), make_string_value("CAGTA"));
    }

    #[test]
    fn test_prototype_keys_start_with_constructor() {
        let class = eukaryote();
        let keys: Vec<String> = class.prototype_keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["constructor", "cellImportinTransport"]);
        assert!(matches!(class.prototype_get("constructor"), Some(Value::Class(c)) if c.is_same(&class)));
    }

    #[test]
    fn test_derived_class_inherits_methods() {
        let base = eukaryote();
        let animal = ClassBuilder::new("Animal")
            .extends(&base)
            .constructor(|ctx| {
                let radius = ctx.arg(1);
                ctx.call_super(&[radius])?;
                ctx.set("name", ctx.arg(0))
            })
            .build();

        let seven = animal.construct(&["Seven".into(), make_number_value(5.0)]).unwrap();
        assert_eq!(seven.get("name"), make_string_value("Seven"));
        assert_eq!(seven.get("radius"), make_number_value(10.0));
        assert!(seven.invoke("cellImportinTransport", &["A".into()]).is_ok());
        assert!(matches!(seven.class(), Some(c) if c.is_same(&animal)));
    }

    #[test]
    fn test_implicit_constructor_forwards_arguments() {
        let base = eukaryote();
        let derived = ClassBuilder::new("Plant").extends(&base).field("leaves", true).build();

        let plant = derived.construct(&[make_number_value(2.0)]).unwrap();
        assert_eq!(plant.get("radius"), make_number_value(4.0));
        assert_eq!(plant.get("leaves"), Value::Bool(true));
    }

    #[test]
    fn test_derived_constructor_forwards_all_arguments() {
        let base = eukaryote();
        let derived = ClassBuilder::new("Plant")
            .extends(&base)
            .constructor(|ctx| {
                let args = ctx.args().to_vec();
                ctx.call_super(&args)?;
                ctx.set("argc", args.len() as f64)
            })
            .build();

        let plant = derived.construct(&[make_number_value(2.0), make_string_value("fern")]).unwrap();
        assert_eq!(plant.get("radius"), make_number_value(4.0));
        assert_eq!(plant.get("argc"), make_number_value(2.0));
    }

    #[test]
    fn test_derived_constructor_must_call_super() {
        let base = eukaryote();
        let broken = ClassBuilder::new("Broken").extends(&base).constructor(|ctx| ctx.set("x", 1.0)).build();

        let error = broken.construct(&[]).unwrap_err();
        assert!(matches!(error, ObjectError::TypeError(message) if message.contains("super constructor")));
    }

    #[test]
    fn test_super_twice_is_an_error() {
        let base = eukaryote();
        let twice = ClassBuilder::new("Twice")
            .extends(&base)
            .constructor(|ctx| {
                ctx.call_super(&[])?;
                ctx.call_super(&[])
            })
            .build();

        assert!(twice.construct(&[]).is_err());
    }

    #[test]
    fn test_private_name_is_class_branded() {
        let mut builder = ClassBuilder::new("Beeper");
        let hidden = builder.declare_private("hiddenPrefixVar", "secretPrefix");
        let beeper = builder
            .constructor({
                let hidden = hidden.clone();
                move |ctx| {
                    let prefix = ctx.private_get(&hidden)?;
                    ctx.set("result", format!("{}_boopmode", prefix))
                }
            })
            .build();

        let instance = beeper.construct(&[]).unwrap();
        assert_eq!(instance.get("result"), make_string_value("secretPrefix_boopmode"));
        assert_eq!(hidden.name(), "#hiddenPrefixVar");
        assert!(hidden.get(&ObjectRef::new_plain()).is_err());
        assert!(hidden.set(&instance, make_number_value(1.0)).is_ok());
        assert_eq!(instance.own_keys().unwrap().len(), 1);
    }

    #[test]
    fn test_fields_cannot_overwrite_frozen_superclass_state() {
        let base = ClassBuilder::new("Base")
            .constructor(|ctx| {
                ctx.set("x", make_number_value(1.0))?;
                ctx.this()?.freeze();
                Ok(())
            })
            .build();
        let derived = ClassBuilder::new("Derived")
            .extends(&base)
            .field("x", make_number_value(2.0))
            .field("y", make_number_value(3.0))
            .build();

        assert!(matches!(derived.construct(&[]), Err(ObjectError::TypeError(_))));

        let sealed = ClassBuilder::new("Sealed")
            .constructor(|ctx| {
                ctx.this()?.prevent_extensions();
                Ok(())
            })
            .build();
        let extended = ClassBuilder::new("Extended").extends(&sealed).field("y", make_number_value(3.0)).build();
        assert!(matches!(extended.construct(&[]), Err(ObjectError::TypeError(_))));
    }
}
