//! `custom_fields` attribute: a map of strings

use provider_sdk::schema::{AttributeType, Element, Schema};
use provider_sdk::ResourceData;
use serde_json::{Map, Value};

/// Attribute name shared by every resource with custom fields
pub const CUSTOM_FIELDS_KEY: &str = "custom_fields";

/// Optional map of custom field values
pub fn custom_fields_schema() -> Schema {
    Schema::map(Element::of(AttributeType::String)).optional()
}

/// Flatten NetBox custom field values into strings.
///
/// Null values are dropped, strings are kept and everything else is JSON
/// encoded. Returns `None` when nothing is left.
pub fn flatten_custom_fields(value: &Value) -> Option<Map<String, Value>> {
    let Value::Object(fields) = value else {
        return None;
    };
    let flat: Map<String, Value> = fields
        .iter()
        .filter_map(|(k, v)| match v {
            Value::Null => None,
            Value::String(s) => Some((k.clone(), Value::String(s.clone()))),
            other => Some((k.clone(), Value::String(other.to_string()))),
        })
        .collect();
    (!flat.is_empty()).then_some(flat)
}

/// Body value for writes; only sent when configured
pub fn custom_fields_payload(d: &ResourceData) -> Option<Value> {
    d.get_ok(CUSTOM_FIELDS_KEY).cloned()
}
