//! Attribute schema
//!
//! A schema is a map from attribute name to [`Schema`]. Attributes are built
//! with small constructors and chained flag setters:
//!
//! ```
//! use provider_sdk::schema::{Schema, Validation};
//!
//! let count = Schema::int()
//!     .optional()
//!     .default_value(1)
//!     .validate(Validation::int_at_least(1))
//!     .description("The number of IP addresses to allocate");
//! assert!(count.is_optional());
//! ```

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Attribute name → attribute schema
pub type SchemaMap = BTreeMap<String, Schema>;

/// Value type of an attribute
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(tag = "type", content = "elem", rename_all = "snake_case")]
pub enum AttributeType {
    #[default]
    String,
    Int,
    Bool,
    Float,
    List(Element),
    Set(Element),
    Map(Element),
}

/// Element of a collection attribute: a primitive type or a nested block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Type(Box<AttributeType>),
    Block(SchemaMap),
}

impl Element {
    pub fn of(attr_type: AttributeType) -> Self {
        Element::Type(Box::new(attr_type))
    }

    pub fn block<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Element::Block(attributes.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

/// Value validators attached to an attribute
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Validation {
    IntAtLeast { min: i64 },
    IntBetween { min: i64, max: i64 },
    StringInSlice { values: Vec<String>, ignore_case: bool },
}

impl Validation {
    pub fn int_at_least(min: i64) -> Self {
        Validation::IntAtLeast { min }
    }

    /// Inclusive on both ends
    pub fn int_between(min: i64, max: i64) -> Self {
        Validation::IntBetween { min, max }
    }

    pub fn string_in_slice(values: &[&str], ignore_case: bool) -> Self {
        Validation::StringInSlice {
            values: values.iter().map(|v| v.to_string()).collect(),
            ignore_case,
        }
    }

    /// Check a configured value; `key` is only used in the message
    pub fn check(&self, key: &str, value: &Value) -> Result<(), String> {
        match self {
            Validation::IntAtLeast { min } => {
                let Some(v) = value.as_i64() else {
                    return Err(format!("expected type of {} to be integer", key));
                };
                if v < *min {
                    return Err(format!("expected {} to be at least ({}), got {}", key, min, v));
                }
                Ok(())
            }
            Validation::IntBetween { min, max } => {
                let Some(v) = value.as_i64() else {
                    return Err(format!("expected type of {} to be integer", key));
                };
                if v < *min || v > *max {
                    return Err(format!("expected {} to be in the range ({} - {}), got {}", key, min, max, v));
                }
                Ok(())
            }
            Validation::StringInSlice { values, ignore_case } => {
                let Some(v) = value.as_str() else {
                    return Err(format!("expected type of {} to be string", key));
                };
                let found = values.iter().any(|allowed| {
                    if *ignore_case {
                        allowed.eq_ignore_ascii_case(v)
                    } else {
                        allowed == v
                    }
                });
                if found {
                    Ok(())
                } else {
                    let quoted: Vec<String> = values.iter().map(|s| format!("{:?}", s)).collect();
                    Err(format!("expected {} to be one of [{}], got {}", key, quoted.join(" "), v))
                }
            }
        }
    }
}

/// Schema of one attribute
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Schema {
    #[serde(flatten)]
    pub attr_type: AttributeType,
    #[serde(skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub optional: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub computed: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub sensitive: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_default: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exactly_one_of: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts_with: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_with: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<Validation>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

fn names(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

impl Schema {
    pub fn of(attr_type: AttributeType) -> Self {
        Self {
            attr_type,
            ..Default::default()
        }
    }

    pub fn string() -> Self {
        Self::of(AttributeType::String)
    }

    pub fn int() -> Self {
        Self::of(AttributeType::Int)
    }

    pub fn bool() -> Self {
        Self::of(AttributeType::Bool)
    }

    pub fn float() -> Self {
        Self::of(AttributeType::Float)
    }

    pub fn list(elem: Element) -> Self {
        Self::of(AttributeType::List(elem))
    }

    pub fn set(elem: Element) -> Self {
        Self::of(AttributeType::Set(elem))
    }

    pub fn map(elem: Element) -> Self {
        Self::of(AttributeType::Map(elem))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn sensitive(mut self) -> Self {
        self.sensitive = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Read the value from this environment variable when it is not configured
    pub fn env_default(mut self, var: &str) -> Self {
        self.env_default = Some(var.to_string());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn exactly_one_of(mut self, keys: &[&str]) -> Self {
        self.exactly_one_of = names(keys);
        self
    }

    pub fn conflicts_with(mut self, keys: &[&str]) -> Self {
        self.conflicts_with = names(keys);
        self
    }

    pub fn required_with(mut self, keys: &[&str]) -> Self {
        self.required_with = names(keys);
        self
    }

    pub fn validate(mut self, validation: Validation) -> Self {
        self.validation = Some(validation);
        self
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Computed and not settable from configuration
    pub fn is_computed_only(&self) -> bool {
        self.computed && !self.required && !self.optional
    }

    /// The value `get` returns for an unset attribute
    pub fn zero_value(&self) -> Value {
        zero_value(&self.attr_type)
    }
}

/// Zero value of a type: "", 0, false, empty collection
pub fn zero_value(attr_type: &AttributeType) -> Value {
    match attr_type {
        AttributeType::String => Value::String(String::new()),
        AttributeType::Int => Value::from(0),
        AttributeType::Bool => Value::Bool(false),
        AttributeType::Float => Value::from(0.0),
        AttributeType::List(_) | AttributeType::Set(_) => Value::Array(vec![]),
        AttributeType::Map(_) => Value::Object(serde_json::Map::new()),
    }
}

/// True when the value is null or equals the zero value of its type
pub fn is_zero(attr_type: &AttributeType, value: &Value) -> bool {
    match (attr_type, value) {
        (_, Value::Null) => true,
        (AttributeType::Float, Value::Number(n)) => n.as_f64() == Some(0.0),
        (AttributeType::Int, Value::Number(n)) => n.as_i64() == Some(0),
        (_, v) => *v == zero_value(attr_type),
    }
}

/// Schema of a resource or data source
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResourceSchema {
    pub attributes: SchemaMap,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Import sets the given id and runs `read`
    pub importable: bool,
}

impl ResourceSchema {
    pub fn new<I, K>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, Schema)>,
        K: Into<String>,
    {
        Self {
            attributes: attributes.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn importable(mut self) -> Self {
        self.importable = true;
        self
    }
}

/// Render a list of allowed values for an attribute description:
/// ``Valid values are `a`, `b` and `c`.``
pub fn build_valid_value_description(values: &[&str]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| format!("`{}`", v)).collect();
    let joined = match quoted.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [head @ .., last] => format!("{} and {}", head.join(", "), last),
    };
    format!("Valid values are {}.", joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn int_between_is_inclusive() {
        let v = Validation::int_between(1, 1024);
        assert!(v.check("address_count", &json!(1)).is_ok());
        assert!(v.check("address_count", &json!(1024)).is_ok());
        assert_eq!(
            v.check("address_count", &json!(i64::MAX)).unwrap_err(),
            format!("expected address_count to be in the range (1 - 1024), got {}", i64::MAX)
        );
        assert!(v.check("address_count", &json!(0)).is_err());
    }

    #[test]
    fn int_at_least_rejects_smaller_values() {
        let v = Validation::int_at_least(1);
        assert!(v.check("address_count", &json!(3)).is_ok());
        assert_eq!(
            v.check("address_count", &json!(0)).unwrap_err(),
            "expected address_count to be at least (1), got 0"
        );
    }

    #[test]
    fn string_in_slice_honours_case_flag() {
        let strict = Validation::string_in_slice(&["active", "reserved"], false);
        assert!(strict.check("status", &json!("active")).is_ok());
        assert_eq!(
            strict.check("status", &json!("Active")).unwrap_err(),
            "expected status to be one of [\"active\" \"reserved\"], got Active"
        );

        let relaxed = Validation::string_in_slice(&["tcp"], true);
        assert!(relaxed.check("protocol", &json!("TCP")).is_ok());
    }

    #[test]
    fn valid_value_description_joins_with_final_conjunction() {
        assert_eq!(
            build_valid_value_description(&["tcp", "udp", "sctp"]),
            "Valid values are `tcp`, `udp` and `sctp`."
        );
        assert_eq!(build_valid_value_description(&["tcp"]), "Valid values are `tcp`.");
    }

    #[test]
    fn zero_values_follow_types() {
        assert!(is_zero(&AttributeType::Int, &json!(0)));
        assert!(!is_zero(&AttributeType::Int, &json!(4)));
        assert!(is_zero(&AttributeType::String, &json!("")));
        assert!(is_zero(&AttributeType::Set(Element::of(AttributeType::String)), &json!([])));
        assert!(is_zero(&AttributeType::Bool, &Value::Null));
    }

    #[test]
    fn computed_only_excludes_optional_computed() {
        assert!(Schema::int().computed().is_computed_only());
        assert!(!Schema::int().optional().computed().is_computed_only());
    }

    #[test]
    fn schema_serializes_type_inline() {
        let schema = Schema::list(Element::of(AttributeType::String)).computed();
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({"type": "list", "elem": {"type": {"type": "string"}}, "computed": true})
        );
    }
}
