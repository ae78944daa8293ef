//! `netbox_services`: list services matching a name and filters

use crate::error::{to_object_id, ProviderError};
use crate::util::{custom_fields_schema, flatten_custom_fields, CUSTOM_FIELDS_KEY};
use crate::Meta;
use anyhow::Context;
use async_trait::async_trait;
use netbox_client::Service;
use provider_sdk::schema::{AttributeType, Element, Schema};
use provider_sdk::{DataSource, ResourceData, ResourceSchema};
use serde_json::{json, Map, Value};
use tracing::{debug, warn};
use uuid::Uuid;

/// `netbox_services` data source
#[derive(Debug, Default)]
pub struct ServicesDataSource;

/// Turn the `name` and `filter` attributes into query parameters
fn query_params(d: &ResourceData) -> Result<Vec<(String, String)>, ProviderError> {
    let mut params = Vec::new();

    let name = d.get_string("name");
    if !name.is_empty() {
        params.push(("name".to_string(), name));
    }

    if let Value::Array(filters) = d.get("filter") {
        for filter in &filters {
            let key = filter.get("name").and_then(Value::as_str).unwrap_or_default();
            let value = filter.get("value").and_then(Value::as_str).unwrap_or_default();
            match key {
                // A service has one protocol, so the last filter wins
                "protocol" => {
                    params.retain(|(k, _)| k != "protocol");
                    params.push((key.to_string(), value.to_string()));
                }
                "tag" => params.push((key.to_string(), value.to_string())),
                other => return Err(ProviderError::UnsupportedFilter(other.to_string())),
            }
        }
    }

    Ok(params)
}

fn flatten_service(service: &Service) -> Value {
    let mut item = Map::new();
    item.insert("id".to_string(), json!(service.id));
    item.insert("name".to_string(), json!(service.name));
    item.insert(
        "virtual_machine_id".to_string(),
        json!(service.virtual_machine.as_ref().map(|vm| vm.id)),
    );
    item.insert("protocol".to_string(), json!(service.protocol.value));
    item.insert("ports".to_string(), json!(service.ports));
    item.insert(
        "ip_addresses".to_string(),
        Value::Array(
            service
                .ipaddresses
                .iter()
                .map(|ip| json!({"id": ip.id, "address": ip.address}))
                .collect(),
        ),
    );
    item.insert("description".to_string(), json!(service.description));
    item.insert(
        "tags".to_string(),
        Value::Array(
            service
                .tags
                .iter()
                .map(|t| json!({"tag_id": t.id, "name": t.name, "slug": t.slug}))
                .collect(),
        ),
    );
    if let Some(fields) = flatten_custom_fields(&service.custom_fields) {
        item.insert(CUSTOM_FIELDS_KEY.to_string(), Value::Object(fields));
    }
    Value::Object(item)
}

#[async_trait]
impl DataSource<Meta> for ServicesDataSource {
    fn schema(&self) -> ResourceSchema {
        let computed = |s: Schema| s.computed();
        ResourceSchema::new([
            ("name", Schema::string().optional()),
            (
                "filter",
                Schema::set(Element::block([
                    ("name", Schema::string().required()),
                    ("value", Schema::string().required()),
                ]))
                .optional(),
            ),
            ("limit", Schema::int().optional()),
            (
                "services",
                Schema::list(Element::block([
                    ("id", computed(Schema::int())),
                    ("name", computed(Schema::string())),
                    ("virtual_machine_id", computed(Schema::int())),
                    ("protocol", computed(Schema::string())),
                    ("ports", computed(Schema::set(Element::of(AttributeType::Int)))),
                    (
                        "ip_addresses",
                        computed(Schema::list(Element::block([
                            ("id", computed(Schema::int())),
                            ("address", computed(Schema::string())),
                        ]))),
                    ),
                    ("description", computed(Schema::string())),
                    (
                        "tags",
                        computed(Schema::list(Element::block([
                            ("tag_id", computed(Schema::int())),
                            ("name", computed(Schema::string())),
                            ("slug", computed(Schema::string())),
                        ]))),
                    ),
                    (CUSTOM_FIELDS_KEY, custom_fields_schema()),
                ]))
                .computed(),
            ),
        ])
    }

    async fn read(&self, d: &mut ResourceData, client: &Meta) -> anyhow::Result<()> {
        let params = query_params(d)?;
        let filters: Vec<(&str, &str)> = params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let limit = to_object_id(d.optional_int("limit"));
        debug!("Querying services with {:?} (limit {:?})", filters, limit);

        let page = match client.query_services(&filters, limit).await {
            Ok(page) => page,
            Err(e) if e.is_not_found() => {
                warn!("Service list endpoint returned 404");
                d.set_id("");
                return Ok(());
            }
            Err(e) => return Err(e).context("listing services"),
        };

        if page.count == 0 {
            return Err(ProviderError::NoServiceFound.into());
        }

        let services: Vec<Value> = page.results.iter().map(flatten_service).collect();
        d.set_id(Uuid::new_v4().to_string());
        d.set("services", services)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netbox_client::{ChoiceField, MockNetBoxClient, NestedIPAddress, NestedTag, NestedVirtualMachine};
    use provider_sdk::{apply_defaults, validate_config, Config};
    use std::sync::Arc;

    fn data(config: Value) -> ResourceData {
        let schema = ServicesDataSource.schema();
        let mut config: Config = config.as_object().cloned().unwrap();
        let mut diags = apply_defaults(&schema.attributes, &mut config);
        diags.extend(validate_config(&schema.attributes, &config));
        assert!(!diags.has_errors(), "{:?}", diags);
        ResourceData::new(Arc::new(schema.attributes), config)
    }

    fn service(id: u64, name: &str, protocol: &str, tags: &[&str]) -> Service {
        Service {
            id,
            url: format!("http://test-netbox/api/ipam/services/{}/", id),
            display: name.to_string(),
            device: None,
            virtual_machine: Some(NestedVirtualMachine {
                id: 100 + id,
                url: String::new(),
                display: format!("vm-{}", id),
                name: format!("vm-{}", id),
            }),
            name: name.to_string(),
            protocol: ChoiceField::new(protocol.to_string(), protocol.to_uppercase()),
            ports: vec![22],
            ipaddresses: vec![NestedIPAddress {
                id: 200 + id,
                url: String::new(),
                display: "10.0.0.9/24".to_string(),
                address: "10.0.0.9/24".to_string(),
            }],
            description: String::new(),
            tags: tags
                .iter()
                .enumerate()
                .map(|(i, t)| NestedTag {
                    id: u64::try_from(i).unwrap() + 1,
                    url: String::new(),
                    display: t.to_string(),
                    name: t.to_string(),
                    slug: t.to_string(),
                })
                .collect(),
            custom_fields: json!({"owner": "ops", "unused": null}),
        }
    }

    fn mock() -> MockNetBoxClient {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_service(service(1, "ssh", "tcp", &["prod"]));
        mock.add_service(service(2, "ssh", "tcp", &["prod", "edge"]));
        mock.add_service(service(3, "dns", "udp", &[]));
        mock
    }

    #[tokio::test]
    async fn filters_by_name_protocol_and_tags() {
        let mock = mock();
        let nb: &Meta = &mock;
        let mut d = data(json!({
            "name": "ssh",
            "filter": [
                {"name": "protocol", "value": "tcp"},
                {"name": "tag", "value": "prod"},
                {"name": "tag", "value": "edge"}
            ]
        }));

        ServicesDataSource.read(&mut d, nb).await.unwrap();

        assert!(Uuid::parse_str(d.id()).is_ok());
        let services = d.get("services");
        let services = services.as_array().unwrap();
        assert_eq!(services.len(), 1);
        assert_eq!(services[0]["id"], 2);
        assert_eq!(services[0]["virtual_machine_id"], 102);
        assert_eq!(services[0]["protocol"], "tcp");
        assert_eq!(services[0]["ip_addresses"][0]["address"], "10.0.0.9/24");
        assert_eq!(services[0]["tags"][1]["slug"], "edge");
        assert_eq!(services[0]["custom_fields"], json!({"owner": "ops"}));
    }

    #[tokio::test]
    async fn last_protocol_filter_wins() {
        let d = data(json!({
            "filter": [
                {"name": "protocol", "value": "tcp"},
                {"name": "tag", "value": "prod"},
                {"name": "protocol", "value": "udp"}
            ]
        }));
        let params = query_params(&d).unwrap();
        let protocols: Vec<&str> = params
            .iter()
            .filter(|(k, _)| k == "protocol")
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(protocols, vec!["udp"]);
        assert!(params.contains(&("tag".to_string(), "prod".to_string())));
    }

    #[tokio::test]
    async fn missing_list_endpoint_clears_id() {
        let mock = mock();
        mock.set_services_unavailable(true);
        let nb: &Meta = &mock;
        let mut d = data(json!({"name": "ssh"}));
        d.set_id("stale");

        ServicesDataSource.read(&mut d, nb).await.unwrap();
        assert_eq!(d.id(), "");
    }

    #[tokio::test]
    async fn limit_truncates_results() {
        let mock = mock();
        let nb: &Meta = &mock;
        let mut d = data(json!({"limit": 2}));

        ServicesDataSource.read(&mut d, nb).await.unwrap();
        assert_eq!(d.get("services").as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unsupported_filter_is_rejected() {
        let mock = mock();
        let nb: &Meta = &mock;
        let mut d = data(json!({"filter": [{"name": "site", "value": "dc1"}]}));

        let err = ServicesDataSource.read(&mut d, nb).await.unwrap_err();
        assert_eq!(err.to_string(), "'site' is not a supported filter parameter");
    }

    #[tokio::test]
    async fn empty_result_is_an_error() {
        let mock = mock();
        let nb: &Meta = &mock;
        let mut d = data(json!({"name": "smtp"}));

        let err = ServicesDataSource.read(&mut d, nb).await.unwrap_err();
        assert_eq!(err.to_string(), "no service found matching filter");
        assert_eq!(d.id(), "");
    }
}
