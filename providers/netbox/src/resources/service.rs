//! `netbox_service`: a network service on a device or virtual machine

use crate::error::{parse_id, to_object_id, ProviderError};
use crate::util::choices::{choice, SERVICE_PROTOCOL_OPTIONS};
use crate::util::{
    custom_fields_payload, custom_fields_schema, flatten_custom_fields, resolve_tags, tag_names, tags_schema,
    CUSTOM_FIELDS_KEY, TAGS_KEY,
};
use crate::Meta;
use anyhow::Context;
use async_trait::async_trait;
use netbox_client::WritableService;
use provider_sdk::schema::{AttributeType, Element, Schema};
use provider_sdk::{Resource, ResourceData, ResourceSchema};
use serde_json::Value;
use tracing::{info, warn};

/// `netbox_service` resource
#[derive(Debug, Default)]
pub struct ServiceResource;

async fn writable(d: &ResourceData, client: &Meta) -> anyhow::Result<WritableService> {
    let ports = d
        .get_int_list("ports")
        .into_iter()
        .map(|p| u32::try_from(p).map_err(|_| ProviderError::InvalidConfig(format!("invalid port {}", p))))
        .collect::<Result<Vec<u32>, _>>()?;

    Ok(WritableService {
        name: d.get_string("name"),
        device: to_object_id(d.optional_int("device_id")),
        virtual_machine: to_object_id(d.optional_int("virtual_machine_id")),
        protocol: d.get_string("protocol"),
        ports,
        description: d.get_string("description"),
        tags: resolve_tags(client, &d.get_string_list(TAGS_KEY)).await?,
        custom_fields: custom_fields_payload(d),
    })
}

#[async_trait]
impl Resource<Meta> for ServiceResource {
    fn schema(&self) -> ResourceSchema {
        let parents = ["virtual_machine_id", "device_id"];
        ResourceSchema::new([
            ("name", Schema::string().required()),
            ("virtual_machine_id", Schema::int().optional().exactly_one_of(&parents)),
            ("device_id", Schema::int().optional().exactly_one_of(&parents)),
            ("protocol", choice(SERVICE_PROTOCOL_OPTIONS).required()),
            ("ports", Schema::set(Element::of(AttributeType::Int)).required()),
            ("description", Schema::string().optional()),
            (TAGS_KEY, tags_schema()),
            (CUSTOM_FIELDS_KEY, custom_fields_schema()),
        ])
        .importable()
    }

    async fn create(&self, d: &mut ResourceData, client: &Meta) -> anyhow::Result<()> {
        let request = writable(d, client).await?;
        let service = client
            .create_service(&request)
            .await
            .with_context(|| format!("creating service {}", request.name))?;
        info!("Created service {} (id {})", service.name, service.id);
        d.set_id(service.id.to_string());
        self.read(d, client).await
    }

    async fn read(&self, d: &mut ResourceData, client: &Meta) -> anyhow::Result<()> {
        let id = parse_id(d.id())?;
        let service = match client.get_service(id).await {
            Ok(service) => service,
            Err(e) if e.is_not_found() => {
                warn!("Service {} no longer exists, removing from state", id);
                d.set_id("");
                return Ok(());
            }
            Err(e) => return Err(e).with_context(|| format!("reading service {}", id)),
        };

        d.set("name", service.name.clone())?;
        d.set("virtual_machine_id", service.virtual_machine.as_ref().map(|vm| vm.id))?;
        d.set("device_id", service.device.as_ref().map(|dev| dev.id))?;
        d.set("protocol", service.protocol.value.clone())?;
        d.set("ports", service.ports.clone())?;
        d.set("description", service.description.clone())?;
        d.set(TAGS_KEY, tag_names(&service.tags))?;
        if let Some(fields) = flatten_custom_fields(&service.custom_fields) {
            d.set(CUSTOM_FIELDS_KEY, Value::Object(fields))?;
        }
        Ok(())
    }

    async fn update(&self, d: &mut ResourceData, client: &Meta) -> anyhow::Result<()> {
        let id = parse_id(d.id())?;
        let request = writable(d, client).await?;
        client
            .update_service(id, &request)
            .await
            .with_context(|| format!("updating service {}", id))?;
        self.read(d, client).await
    }

    async fn delete(&self, d: &mut ResourceData, client: &Meta) -> anyhow::Result<()> {
        let id = parse_id(d.id())?;
        match client.delete_service(id).await {
            Ok(()) => info!("Deleted service {}", id),
            Err(e) if e.is_not_found() => warn!("Service {} was already deleted", id),
            Err(e) => return Err(e).with_context(|| format!("deleting service {}", id)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use netbox_client::MockNetBoxClient;
    use provider_sdk::{apply_defaults, validate_config, Config};
    use serde_json::json;
    use std::sync::Arc;

    fn data(config: Value) -> ResourceData {
        let schema = ServiceResource.schema();
        let mut config: Config = config.as_object().cloned().unwrap();
        let mut diags = apply_defaults(&schema.attributes, &mut config);
        diags.extend(validate_config(&schema.attributes, &config));
        assert!(!diags.has_errors(), "{:?}", diags);
        ResourceData::new(Arc::new(schema.attributes), config)
    }

    #[test]
    fn parent_is_exactly_one_of() {
        let schema = ServiceResource.schema();
        let config: Config = json!({
            "name": "ssh",
            "protocol": "tcp",
            "ports": [22],
            "device_id": 1,
            "virtual_machine_id": 2
        })
        .as_object()
        .cloned()
        .unwrap();
        let diags = validate_config(&schema.attributes, &config);
        assert_eq!(diags.error_summaries().len(), 1);
        assert!(diags.error_summaries()[0].contains("only one of `device_id,virtual_machine_id`"));
    }

    #[tokio::test]
    async fn lifecycle_against_mock() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        let nb: &Meta = &mock;
        mock.add_tag("acctest", "acctest");

        let mut d = data(json!({
            "name": "https",
            "virtual_machine_id": 7,
            "protocol": "tcp",
            "ports": [443, 8443, 443],
            "tags": ["acctest"]
        }));
        ServiceResource.create(&mut d, nb).await.unwrap();

        let id = parse_id(d.id()).unwrap();
        let stored = mock.service(id).unwrap();
        assert_eq!(stored.ports, vec![443, 8443]);
        assert_eq!(stored.virtual_machine.unwrap().id, 7);
        assert_eq!(d.get_string_list(TAGS_KEY), vec!["acctest"]);
        assert_eq!(d.optional_int("device_id"), None);

        d.set("protocol", "udp").unwrap();
        d.set("description", "quic").unwrap();
        ServiceResource.update(&mut d, nb).await.unwrap();
        let stored = mock.service(id).unwrap();
        assert_eq!(stored.protocol.value, "udp");
        assert_eq!(d.get_string("description"), "quic");

        ServiceResource.delete(&mut d, nb).await.unwrap();
        assert!(mock.service(id).is_none());

        // A second delete sees a 404 and still succeeds
        ServiceResource.delete(&mut d, nb).await.unwrap();

        ServiceResource.read(&mut d, nb).await.unwrap();
        assert_eq!(d.id(), "");
    }

    #[tokio::test]
    async fn create_with_unknown_tag_creates_nothing() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        let nb: &Meta = &mock;
        let mut d = data(json!({
            "name": "dns",
            "device_id": 3,
            "protocol": "udp",
            "ports": [53],
            "tags": ["ghost"]
        }));

        let err = ServiceResource.create(&mut d, nb).await.unwrap_err();
        assert_eq!(err.to_string(), "could not find tag ghost");
        assert_eq!(d.id(), "");
    }
}
