//! Attribute map handed to resource callbacks

use crate::error::SdkError;
use crate::schema::{is_zero, SchemaMap};
use crate::validation::Config;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Current attribute values of one resource or data source instance
#[derive(Debug, Clone)]
pub struct ResourceData {
    schema: Arc<SchemaMap>,
    id: String,
    values: Map<String, Value>,
}

impl ResourceData {
    /// Start from a (defaulted) configuration with no id
    pub fn new(schema: Arc<SchemaMap>, config: Config) -> Self {
        let values = config
            .into_iter()
            .filter(|(k, v)| schema.contains_key(k) && !v.is_null())
            .collect();
        Self {
            schema,
            id: String::new(),
            values,
        }
    }

    /// Rebuild from a state object previously produced by [`ResourceData::state`]
    pub fn from_state(schema: Arc<SchemaMap>, state: &Value) -> Self {
        let mut data = Self::new(schema, Map::new());
        if let Value::Object(obj) = state {
            for (k, v) in obj {
                if k == "id" {
                    data.id = v.as_str().map(str::to_string).unwrap_or_else(|| {
                        v.as_i64().map(|n| n.to_string()).unwrap_or_default()
                    });
                } else if data.schema.contains_key(k) && !v.is_null() {
                    data.values.insert(k.clone(), v.clone());
                }
            }
        }
        data
    }

    /// Prior state with configurable attributes taken from the new config.
    ///
    /// Attributes that are computed keep their prior value when the config
    /// leaves them out.
    pub fn for_update(schema: Arc<SchemaMap>, prior: &Value, config: &Config) -> Self {
        let mut data = Self::from_state(schema, prior);
        let schema = Arc::clone(&data.schema);
        for (key, attr) in schema.iter() {
            if attr.is_computed_only() {
                continue;
            }
            match config.get(key).filter(|v| !v.is_null()) {
                Some(v) => {
                    data.values.insert(key.clone(), v.clone());
                }
                None if !attr.computed => {
                    data.values.remove(key);
                }
                None => {}
            }
        }
        data
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// An empty id marks the object as gone
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    /// Stored value, or the zero value of the attribute type
    pub fn get(&self, key: &str) -> Value {
        match self.values.get(key) {
            Some(v) => v.clone(),
            None => self
                .schema
                .get(key)
                .map(|s| s.zero_value())
                .unwrap_or(Value::Null),
        }
    }

    /// Value only when it is set and not the zero value
    pub fn get_ok(&self, key: &str) -> Option<&Value> {
        let attr = self.schema.get(key)?;
        self.values.get(key).filter(|v| !is_zero(&attr.attr_type, v))
    }

    pub fn get_string(&self, key: &str) -> String {
        self.values
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    pub fn get_int(&self, key: &str) -> i64 {
        self.values.get(key).and_then(Value::as_i64).unwrap_or_default()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.values.get(key).and_then(Value::as_bool).unwrap_or_default()
    }

    pub fn get_string_list(&self, key: &str) -> Vec<String> {
        match self.values.get(key) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn get_int_list(&self, key: &str) -> Vec<i64> {
        match self.values.get(key) {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_i64).collect(),
            _ => Vec::new(),
        }
    }

    /// String map attribute; non-string values are skipped
    pub fn get_string_map(&self, key: &str) -> Vec<(String, String)> {
        match self.values.get(key) {
            Some(Value::Object(entries)) => entries
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// `Some` when the attribute is set to a non-zero integer
    pub fn optional_int(&self, key: &str) -> Option<i64> {
        self.get_ok(key).and_then(Value::as_i64)
    }

    /// `Some` when the attribute is set to a non-empty string
    pub fn optional_string(&self, key: &str) -> Option<String> {
        self.get_ok(key).and_then(Value::as_str).map(str::to_string)
    }

    /// Store a value. `Value::Null` unsets the attribute.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<(), SdkError> {
        if !self.schema.contains_key(key) {
            return Err(SdkError::UnknownAttribute(key.to_string()));
        }
        let value = value.into();
        if value.is_null() {
            self.values.remove(key);
        } else {
            self.values.insert(key.to_string(), value);
        }
        Ok(())
    }

    pub fn clear(&mut self, key: &str) {
        self.values.remove(key);
    }

    /// `{"id": ..., <every schema attribute>}`, or null once the id is empty
    pub fn state(&self) -> Value {
        if self.id.is_empty() {
            return Value::Null;
        }
        let mut obj = Map::new();
        obj.insert("id".to_string(), Value::String(self.id.clone()));
        for key in self.schema.keys() {
            obj.insert(key.clone(), self.values.get(key).cloned().unwrap_or(Value::Null));
        }
        Value::Object(obj)
    }
}
