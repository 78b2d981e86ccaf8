// src/config/container.rs

//! Dot-path addressed nested configuration store.
//!
//! A [`Container`] wraps a `serde_yaml::Value` tree and exposes lookup and
//! mutation by dot-delimited paths (`"a.b.c"`). Lookups never fail: an
//! absent path simply yields `None`. Writes are destructive and create
//! intermediate mappings as needed.
//!
//! A container performs no I/O; loading a file into one is the job of
//! [`crate::config::loader`].

use serde_yaml::{Mapping, Value};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Container {
    root: Value,
}

impl Container {
    /// Empty container (an empty mapping at the root).
    pub fn new() -> Self {
        Self {
            root: Value::Mapping(Mapping::new()),
        }
    }

    /// Wrap an already-parsed value tree.
    ///
    /// Non-mapping roots are wrapped as `{value: <v>}` so that path writes
    /// always have a mapping to land in.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Mapping(_) => Self { root: value },
            other => {
                let mut map = Mapping::new();
                map.insert(Value::String("value".to_string()), other);
                Self {
                    root: Value::Mapping(map),
                }
            }
        }
    }

    /// The underlying value tree.
    pub fn as_value(&self) -> &Value {
        &self.root
    }

    /// Resolve a dot-path to a value, or `None` if any segment is absent.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut current = &self.root;
        for segment in path.split('.') {
            current = current.as_mapping()?.get(segment)?;
        }
        Some(current)
    }

    /// `true` iff the path resolves to a value (an explicit null counts).
    pub fn has(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Destructive write, creating (or overwriting) intermediate mappings.
    pub fn set(&mut self, path: &str, value: impl Into<Value>) -> &mut Self {
        let segments: Vec<&str> = path.split('.').collect();
        let mut current = &mut self.root;

        for segment in &segments[..segments.len() - 1] {
            if !current.is_mapping() {
                *current = Value::Mapping(Mapping::new());
            }
            let map = current.as_mapping_mut().unwrap();
            let key = Value::String((*segment).to_string());
            if !matches!(map.get(&key), Some(Value::Mapping(_))) {
                map.insert(key.clone(), Value::Mapping(Mapping::new()));
            }
            current = map.get_mut(&key).unwrap();
        }

        if !current.is_mapping() {
            *current = Value::Mapping(Mapping::new());
        }
        let last = segments[segments.len() - 1];
        current
            .as_mapping_mut()
            .unwrap()
            .insert(Value::String(last.to_string()), value.into());
        self
    }

    /// Remove the value at the path, if present.
    pub fn del(&mut self, path: &str) -> &mut Self {
        let segments: Vec<&str> = path.split('.').collect();
        let Some((last, parents)) = segments.split_last() else {
            return self;
        };

        let mut current = Some(&mut self.root);
        for segment in parents {
            current = current
                .and_then(Value::as_mapping_mut)
                .and_then(|map| map.get_mut(*segment));
        }

        if let Some(map) = current.and_then(Value::as_mapping_mut) {
            map.remove(*last);
        }
        self
    }

    /// String value at the path, if present and a string.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    /// Boolean value at the path, if present and a bool.
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }

    /// Unsigned integer value at the path, if present and numeric.
    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get(path).and_then(Value::as_u64)
    }

    /// Sequence value at the path, if present and a sequence.
    pub fn get_seq(&self, path: &str) -> Option<&Vec<Value>> {
        self.get(path).and_then(Value::as_sequence)
    }

    /// Top-level keys of the root mapping.
    pub fn keys(&self) -> Vec<String> {
        match self.root.as_mapping() {
            Some(map) => map
                .keys()
                .filter_map(|k| k.as_str().map(str::to_string))
                .collect(),
            None => Vec::new(),
        }
    }
}
