//! Outbound payload assembly.
//!
//! The wire contract is "omit, don't null": optional fields that are absent
//! must not appear in the JSON at all. The builder makes that rule the only
//! way to add a field, so call sites cannot accidentally serialize nulls.

use serde_json::{Map, Value};

/// Builder for one request body. Ephemeral; built fresh per physical call's
/// logical operation and dropped with it.
#[derive(Debug, Default)]
pub(crate) struct PayloadBuilder {
    map: Map<String, Value>,
}

impl PayloadBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required field.
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.map.insert(key.to_string(), value.into());
        self
    }

    /// Add an optional field only when it has a value.
    pub fn opt_field<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        if let Some(value) = value {
            self.map.insert(key.to_string(), value.into());
        }
        self
    }

    /// Add a string-array field only when the collection is non-empty.
    pub fn opt_list(mut self, key: &str, values: Option<Vec<String>>) -> Self {
        if let Some(values) = values
            && !values.is_empty()
        {
            self.map.insert(
                key.to_string(),
                Value::Array(values.into_iter().map(Value::String).collect()),
            );
        }
        self
    }

    pub fn build(self) -> Value {
        Value::Object(self.map)
    }
}
