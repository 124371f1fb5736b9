use std::collections::HashMap;
use std::fmt;

use crate::value::{SymbolId, Value};

/// A property key: either a string or a symbol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyKey {
    String(String),
    Symbol(SymbolId),
}

impl PropertyKey {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyKey::String(s) => Some(s),
            PropertyKey::Symbol(_) => None,
        }
    }

    fn array_index(&self) -> Option<u32> {
        let s = self.as_str()?;
        // "01", "+1", "1 " and "" are plain string keys, not indices.
        if s.is_empty() || (s.len() > 1 && s.starts_with('0')) || !s.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        s.parse::<u32>().ok().filter(|n| *n != u32::MAX)
    }
}

impl fmt::Display for PropertyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKey::String(s) => write!(f, "{s}"),
            PropertyKey::Symbol(id) => write!(f, "Symbol({})", id.0),
        }
    }
}

impl From<&str> for PropertyKey {
    fn from(s: &str) -> Self {
        PropertyKey::String(s.to_string())
    }
}

impl From<String> for PropertyKey {
    fn from(s: String) -> Self {
        PropertyKey::String(s)
    }
}

impl From<SymbolId> for PropertyKey {
    fn from(id: SymbolId) -> Self {
        PropertyKey::Symbol(id)
    }
}

/// A data property with its attribute flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub value: Value,
    pub enumerable: bool,
    pub writable: bool,
}

impl Property {
    /// Writable and enumerable, as produced by plain assignment.
    pub fn data(value: Value) -> Self {
        Self { value, enumerable: true, writable: true }
    }

    pub fn hidden(value: Value) -> Self {
        Self { value, enumerable: false, writable: true }
    }
}

/// Ordered own-property storage.
///
/// Keys keep their first insertion position; overwriting a key does not move it.
#[derive(Clone, Default)]
pub struct Table {
    entries: Vec<(PropertyKey, Property)>,
    index: HashMap<PropertyKey, usize>,
}

impl Table {
    pub fn new() -> Self {
        Table { entries: Vec::new(), index: HashMap::new() }
    }

    /// Inserts or replaces; returns the previous property under `key`.
    pub fn insert(&mut self, key: PropertyKey, property: Property) -> Option<Property> {
        match self.index.get(&key) {
            Some(&slot) => Some(std::mem::replace(&mut self.entries[slot].1, property)),
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, property));
                None
            }
        }
    }

    pub fn find(&self, key: &PropertyKey) -> Option<&Property> {
        self.index.get(key).map(|&slot| &self.entries[slot].1)
    }

    pub fn find_mut(&mut self, key: &PropertyKey) -> Option<&mut Property> {
        match self.index.get(key) {
            Some(&slot) => Some(&mut self.entries[slot].1),
            None => None,
        }
    }

    pub fn contains(&self, key: &PropertyKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn remove(&mut self, key: &PropertyKey) -> Option<Property> {
        let slot = self.index.remove(key)?;
        let (_, property) = self.entries.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(property)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Own keys in enumeration order: array indices ascending, then string keys
    /// in insertion order, then symbols in insertion order.
    pub fn keys(&self) -> Vec<PropertyKey> {
        let mut indices: Vec<(u32, &PropertyKey)> = Vec::new();
        let mut strings: Vec<&PropertyKey> = Vec::new();
        let mut symbols: Vec<&PropertyKey> = Vec::new();

        for (key, _) in &self.entries {
            match key {
                PropertyKey::String(_) => match key.array_index() {
                    Some(n) => indices.push((n, key)),
                    None => strings.push(key),
                },
                PropertyKey::Symbol(_) => symbols.push(key),
            }
        }

        indices.sort_by_key(|(n, _)| *n);
        indices
            .into_iter()
            .map(|(_, key)| key)
            .chain(strings)
            .chain(symbols)
            .cloned()
            .collect()
    }

    /// Entries in the same order as [`Table::keys`].
    pub fn iter(&self) -> impl Iterator<Item = (PropertyKey, &Property)> + '_ {
        self.keys().into_iter().filter_map(move |key| {
            let property = self.find(&key)?;
            Some((key, property))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::make_number_value;

    fn names(table: &Table) -> Vec<String> {
        table.keys().iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut table = Table::new();
        table.insert("a".into(), Property::data(make_number_value(1.0)));
        table.insert("b".into(), Property::data(make_number_value(2.0)));
        let previous = table.insert("a".into(), Property::data(make_number_value(3.0)));

        assert_eq!(previous.map(|p| p.value), Some(make_number_value(1.0)));
        assert_eq!(names(&table), vec!["a", "b"]);
        assert_eq!(table.find(&"a".into()).map(|p| p.value.clone()), Some(make_number_value(3.0)));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_key_order_indices_strings_symbols() {
        let mut table = Table::new();
        table.insert(SymbolId(7).into(), Property::data(make_number_value(0.0)));
        table.insert("name".into(), Property::data(make_number_value(0.0)));
        table.insert("10".into(), Property::data(make_number_value(0.0)));
        table.insert("2".into(), Property::data(make_number_value(0.0)));
        table.insert("02".into(), Property::data(make_number_value(0.0)));
        table.insert("+1".into(), Property::data(make_number_value(0.0)));
        table.insert("1 ".into(), Property::data(make_number_value(0.0)));

        assert_eq!(names(&table), vec!["2", "10", "name", "02", "+1", "1 ", "Symbol(7)"]);
    }

    #[test]
    fn test_remove_reindexes() {
        let mut table = Table::new();
        table.insert("a".into(), Property::data(make_number_value(1.0)));
        table.insert("b".into(), Property::data(make_number_value(2.0)));
        table.insert("c".into(), Property::data(make_number_value(3.0)));

        assert!(table.remove(&"a".into()).is_some());
        assert!(table.remove(&"missing".into()).is_none());
        assert_eq!(names(&table), vec!["b", "c"]);
        assert_eq!(table.find(&"c".into()).map(|p| p.value.clone()), Some(make_number_value(3.0)));
    }
}
