//! Configuration validation and defaults

use crate::diagnostics::Diagnostics;
use crate::schema::{AttributeType, Element, SchemaMap, Validation};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

/// Attribute configuration as received from the engine
pub type Config = Map<String, Value>;

fn is_set(config: &Config, key: &str) -> bool {
    config.get(key).is_some_and(|v| !v.is_null())
}

fn join_keys(keys: &[String]) -> String {
    keys.join(",")
}

/// Validate a configuration object against a schema.
///
/// Defaults should be applied first so that environment-provided values
/// satisfy `required`.
pub fn validate_config(schema: &SchemaMap, config: &Config) -> Diagnostics {
    let mut diags = Diagnostics::new();
    validate_block("", schema, config, &mut diags);
    validate_constraints(schema, config, &mut diags);
    diags
}

fn path_of(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", prefix, key)
    }
}

fn validate_block(prefix: &str, schema: &SchemaMap, config: &Config, diags: &mut Diagnostics) {
    for key in config.keys() {
        if !schema.contains_key(key) {
            diags.error_at(
                path_of(prefix, key),
                format!("An argument named \"{}\" is not expected here", key),
            );
        }
    }

    for (key, attr) in schema {
        let path = path_of(prefix, key);
        let value = config.get(key).filter(|v| !v.is_null());

        let Some(value) = value else {
            if attr.required {
                diags.error_at(
                    &path,
                    format!("The argument \"{}\" is required, but no definition was found.", key),
                );
            }
            continue;
        };

        if attr.is_computed_only() {
            diags.error_at(&path, format!("\"{}\": this field cannot be set", key));
            continue;
        }

        if !check_type(&path, &attr.attr_type, value, diags) {
            continue;
        }

        if let Some(validation) = &attr.validation {
            check_validation(&path, key, validation, &attr.attr_type, value, diags);
        }
    }
}

fn check_validation(
    path: &str,
    key: &str,
    validation: &Validation,
    attr_type: &AttributeType,
    value: &Value,
    diags: &mut Diagnostics,
) {
    // Collection validators apply to each element
    match (attr_type, value) {
        (AttributeType::List(_) | AttributeType::Set(_), Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                if let Err(msg) = validation.check(&format!("{}.{}", key, i), item) {
                    diags.error_at(format!("{}.{}", path, i), msg);
                }
            }
        }
        _ => {
            if let Err(msg) = validation.check(key, value) {
                diags.error_at(path, msg);
            }
        }
    }
}

fn type_name(attr_type: &AttributeType) -> &'static str {
    match attr_type {
        AttributeType::String => "string",
        AttributeType::Int => "number",
        AttributeType::Bool => "bool",
        AttributeType::Float => "number",
        AttributeType::List(_) => "list",
        AttributeType::Set(_) => "set",
        AttributeType::Map(_) => "map",
    }
}

/// Returns false when the value has the wrong shape
fn check_type(path: &str, attr_type: &AttributeType, value: &Value, diags: &mut Diagnostics) -> bool {
    let ok = match (attr_type, value) {
        (AttributeType::String, Value::String(_)) => true,
        (AttributeType::Int, Value::Number(n)) => n.is_i64() || n.is_u64(),
        (AttributeType::Float, Value::Number(_)) => true,
        (AttributeType::Bool, Value::Bool(_)) => true,
        (AttributeType::List(elem) | AttributeType::Set(elem), Value::Array(items)) => {
            let mut all = true;
            for (i, item) in items.iter().enumerate() {
                all &= check_element(&format!("{}.{}", path, i), elem, item, diags);
            }
            return all;
        }
        (AttributeType::Map(elem), Value::Object(entries)) => {
            let mut all = true;
            for (k, item) in entries {
                all &= check_element(&format!("{}.{}", path, k), elem, item, diags);
            }
            return all;
        }
        _ => false,
    };
    if !ok {
        diags.error_at(
            path,
            format!(
                "Inappropriate value for attribute \"{}\": {} required.",
                path,
                type_name(attr_type)
            ),
        );
    }
    ok
}

fn check_element(path: &str, elem: &Element, value: &Value, diags: &mut Diagnostics) -> bool {
    match elem {
        Element::Type(inner) => check_type(path, inner, value, diags),
        Element::Block(schema) => match value {
            Value::Object(block) => {
                let before = diags.len();
                validate_block(path, schema, block, diags);
                validate_constraints(schema, block, diags);
                diags.len() == before
            }
            _ => {
                diags.error_at(path, format!("Inappropriate value for attribute \"{}\": object required.", path));
                false
            }
        },
    }
}

fn validate_constraints(schema: &SchemaMap, config: &Config, diags: &mut Diagnostics) {
    let mut seen_groups = BTreeSet::new();

    for (key, attr) in schema {
        if !attr.exactly_one_of.is_empty() {
            let mut group: Vec<String> = attr.exactly_one_of.clone();
            if !group.contains(key) {
                group.push(key.clone());
            }
            group.sort();
            group.dedup();

            if seen_groups.insert(group.clone()) {
                let specified: Vec<String> =
                    group.iter().filter(|k| is_set(config, k)).cloned().collect();
                match specified.len() {
                    0 => diags.error_at(
                        key,
                        format!("\"{}\": one of `{}` must be specified", key, join_keys(&group)),
                    ),
                    1 => {}
                    _ => diags.error_at(
                        key,
                        format!(
                            "\"{}\": only one of `{}` can be specified, but `{}` were specified.",
                            key,
                            join_keys(&group),
                            join_keys(&specified)
                        ),
                    ),
                }
            }
        }

        if !is_set(config, key) {
            continue;
        }

        for other in &attr.conflicts_with {
            if is_set(config, other) {
                diags.error_at(key, format!("\"{}\": conflicts with {}", key, other));
            }
        }

        if !attr.required_with.is_empty() && attr.required_with.iter().any(|k| !is_set(config, k)) {
            let mut all = attr.required_with.clone();
            if !all.contains(key) {
                all.insert(0, key.clone());
            }
            diags.error_at(
                key,
                format!("\"{}\": all of `{}` must be specified", key, join_keys(&all)),
            );
        }
    }
}

/// Fill absent attributes from their environment variable, then their
/// static default. Set-typed values are de-duplicated in place.
pub fn apply_defaults(schema: &SchemaMap, config: &mut Config) -> Diagnostics {
    let mut diags = Diagnostics::new();

    for (key, attr) in schema {
        if is_set(config, key) {
            if let (AttributeType::Set(_), Some(Value::Array(items))) =
                (&attr.attr_type, config.get_mut(key))
            {
                dedup_in_place(items);
            }
            continue;
        }

        let from_env = attr
            .env_default
            .as_ref()
            .and_then(|var| std::env::var(var).ok().map(|raw| (var, raw)));
        if let Some((var, raw)) = from_env {
            match parse_env(&attr.attr_type, &raw) {
                Some(value) => {
                    config.insert(key.clone(), value);
                    continue;
                }
                None => {
                    diags.error_at(
                        key,
                        format!(
                            "environment variable {} has an invalid value for {}: {:?}",
                            var,
                            type_name(&attr.attr_type),
                            raw
                        ),
                    );
                    continue;
                }
            }
        }

        if let Some(default) = &attr.default {
            config.insert(key.clone(), default.clone());
        }
    }

    diags
}

fn dedup_in_place(items: &mut Vec<Value>) {
    let mut unique: Vec<Value> = Vec::with_capacity(items.len());
    for item in items.drain(..) {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    *items = unique;
}

fn parse_env(attr_type: &AttributeType, raw: &str) -> Option<Value> {
    match attr_type {
        AttributeType::String => Some(Value::String(raw.to_string())),
        AttributeType::Int => raw.trim().parse::<i64>().ok().map(Value::from),
        AttributeType::Float => raw.trim().parse::<f64>().ok().map(Value::from),
        AttributeType::Bool => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "t" | "true" => Some(Value::Bool(true)),
            "0" | "f" | "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => serde_json::from_str(raw).ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Schema, Validation};
    use serde_json::json;

    fn config(value: Value) -> Config {
        match value {
            Value::Object(map) => map,
            _ => panic!("config must be an object"),
        }
    }

    fn allocation_schema() -> SchemaMap {
        [
            ("prefix_id", Schema::int().optional().exactly_one_of(&["prefix_id", "ip_range_id"])),
            ("ip_range_id", Schema::int().optional().exactly_one_of(&["prefix_id", "ip_range_id"])),
            (
                "address_count",
                Schema::int().optional().default_value(1).validate(Validation::int_at_least(1)),
            ),
            ("interface_id", Schema::int().optional().required_with(&["object_type"])),
            ("object_type", Schema::string().optional().required_with(&["interface_id"])),
            (
                "virtual_machine_interface_id",
                Schema::int().optional().conflicts_with(&["interface_id"]),
            ),
            ("ip_addresses", Schema::list(Element::of(AttributeType::String)).computed()),
            ("tags", Schema::set(Element::of(AttributeType::String)).optional()),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect()
    }

    #[test]
    fn exactly_one_of_reported_once_per_group() {
        let schema = allocation_schema();

        let diags = validate_config(&schema, &config(json!({})));
        assert_eq!(
            diags.error_summaries(),
            vec!["\"ip_range_id\": one of `ip_range_id,prefix_id` must be specified"]
        );

        let diags = validate_config(&schema, &config(json!({"prefix_id": 1, "ip_range_id": 2})));
        assert_eq!(diags.error_summaries().len(), 1);
        assert!(diags.error_summaries()[0].contains("only one of"));

        assert!(validate_config(&schema, &config(json!({"prefix_id": 1}))).is_empty());
    }

    #[test]
    fn relationship_constraints() {
        let schema = allocation_schema();

        let diags = validate_config(&schema, &config(json!({"prefix_id": 1, "interface_id": 5})));
        assert_eq!(
            diags.error_summaries(),
            vec!["\"interface_id\": all of `interface_id,object_type` must be specified"]
        );

        let diags = validate_config(
            &schema,
            &config(json!({
                "prefix_id": 1,
                "interface_id": 5,
                "object_type": "dcim.interface",
                "virtual_machine_interface_id": 6
            })),
        );
        assert_eq!(
            diags.error_summaries(),
            vec!["\"virtual_machine_interface_id\": conflicts with interface_id"]
        );
    }

    #[test]
    fn rejects_unknown_computed_and_mistyped_values() {
        let schema = allocation_schema();
        let diags = validate_config(
            &schema,
            &config(json!({
                "prefix_id": "one",
                "bogus": true,
                "ip_addresses": ["10.0.0.1/24"],
                "address_count": 0,
                "tags": ["a", 3]
            })),
        );
        let summaries = diags.error_summaries();
        assert!(summaries.contains(&"An argument named \"bogus\" is not expected here"));
        assert!(summaries.contains(&"\"ip_addresses\": this field cannot be set"));
        assert!(summaries.contains(&"Inappropriate value for attribute \"prefix_id\": number required."));
        assert!(summaries.contains(&"expected address_count to be at least (1), got 0"));
        assert!(summaries.contains(&"Inappropriate value for attribute \"tags.1\": string required."));
    }

    #[test]
    fn nested_blocks_are_validated() {
        let schema: SchemaMap = [(
            "filter".to_string(),
            Schema::set(Element::block([
                ("name", Schema::string().required()),
                ("value", Schema::string().required()),
            ]))
            .optional(),
        )]
        .into_iter()
        .collect();

        let diags = validate_config(&schema, &config(json!({"filter": [{"name": "protocol"}]})));
        assert_eq!(
            diags.error_summaries(),
            vec!["The argument \"value\" is required, but no definition was found."]
        );
        assert_eq!(diags.iter().next().unwrap().attribute.as_deref(), Some("filter.0.value"));
    }

    #[test]
    fn defaults_fill_absent_values_and_sets_dedup() {
        let schema = allocation_schema();
        let mut cfg = config(json!({"prefix_id": 1, "tags": ["a", "b", "a"]}));
        let diags = apply_defaults(&schema, &mut cfg);
        assert!(diags.is_empty());
        assert_eq!(cfg["address_count"], json!(1));
        assert_eq!(cfg["tags"], json!(["a", "b"]));
        assert!(!cfg.contains_key("interface_id"));
    }

    #[test]
    fn env_values_are_parsed_by_type() {
        assert_eq!(parse_env(&AttributeType::Int, " 30 "), Some(json!(30)));
        assert_eq!(parse_env(&AttributeType::Bool, "TRUE"), Some(json!(true)));
        assert_eq!(parse_env(&AttributeType::Bool, "nope"), None);
        assert_eq!(
            parse_env(&AttributeType::Map(Element::of(AttributeType::String)), r#"{"X-A":"b"}"#),
            Some(json!({"X-A": "b"}))
        );
    }
}
