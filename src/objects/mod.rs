pub mod object;
pub mod object_class;
pub mod object_native_function;
