use crate::objects::object::ObjectRef;
use crate::value::Value;

/// Nested objects deeper than this print as `[Object]`.
const MAX_DUMP_DEPTH: usize = 2;

/// Console-style rendering of a value, e.g. `Animal { name: 'Seven', NP: { beep: [Function: beep] } }`.
pub fn dump_value(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value, 0);
    out
}

pub fn dump_object(object: &ObjectRef) -> String {
    let mut out = String::new();
    write_object(&mut out, object, 0);
    out
}

fn write_value(out: &mut String, value: &Value, depth: usize) {
    match value {
        Value::String(s) if depth > 0 => {
            out.push('\'');
            out.push_str(s);
            out.push('\'');
        }
        Value::Function(function) => out.push_str(&format!("[Function: {}]", function.name())),
        Value::Class(class) => out.push_str(&format!("[class {}]", class.name())),
        Value::Object(object) => write_object(out, object, depth),
        other => out.push_str(&other.to_string()),
    }
}

fn write_object(out: &mut String, object: &ObjectRef, depth: usize) {
    if depth > MAX_DUMP_DEPTH {
        out.push_str("[Object]");
        return;
    }
    if let Some(class) = object.class() {
        out.push_str(class.name());
        out.push(' ');
    }
    let entries = match object.own_enumerable_entries() {
        Ok(entries) => entries,
        Err(_) => {
            out.push_str("<opaque>");
            return;
        }
    };
    if entries.is_empty() {
        out.push_str("{}");
        return;
    }
    out.push_str("{ ");
    for (index, (key, value)) in entries.iter().enumerate() {
        if index > 0 {
            out.push_str(", ");
        }
        out.push_str(key);
        out.push_str(": ");
        match value {
            Value::Object(nested) if nested.ptr_eq(object) => out.push_str("[Circular]"),
            _ => write_value(out, value, depth + 1),
        }
    }
    out.push_str(" }");
}

/// Layout summary used by the `debug_print_objects` feature.
#[cfg(feature = "debug_print_objects")]
pub fn describe_object(object: &ObjectRef) -> String {
    let keys = object
        .own_keys()
        .map(|keys| keys.iter().map(|k| k.to_string()).collect::<Vec<_>>().join(", "))
        .unwrap_or_else(|error| error.to_string());
    format!(
        "== {:?} ==\ntype:    {}\nstate:   {}\nprivate: {} slot(s)\nown:     [{}]",
        object,
        object.object_type(),
        object.state(),
        object.private_len(),
        keys
    )
}
