//! A small prototype-style object model and the mixin pattern built on it.
//!
//! Donor classes call [`make_mixable`] on themselves so their prototype methods
//! become own properties; hosts pull donors in with [`mixin`], either flat or
//! under a namespace ([`mixin_namespaced`]). [`Composer`] adds an explicit
//! conflict policy and [`capability::HostAssembly`] replaces copying with named
//! delegation.

pub mod capability;
pub mod config;
pub mod debug;
pub mod error;
pub mod mixin;
pub mod objects;
pub mod strategy;
pub mod table;
pub mod value;

pub use capability::{Capability, CapabilityHost, HostAssembly, ObjectCapability};
pub use config::ComposerConfig;
pub use error::{ConfigError, ObjectError};
pub use mixin::{list_methods_of, make_mixable, make_mixable_class, mixin, mixin_namespaced, MethodListing};
pub use objects::object::{InstanceState, NativeObject, ObjectRef, ObjectType};
pub use objects::object_class::{ClassBuilder, Construction, ObjectClass, PrivateName};
pub use objects::object_native_function::{arg, make_native_function_value, ObjectNativeFunction};
pub use strategy::{Composer, MergeStrategy};
pub use table::{Property, PropertyKey};
pub use value::{SymbolId, Value, ValueType};
