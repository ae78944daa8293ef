//! `netbox_available_ip_addresses`: allocate the next free addresses of a
//! prefix or IP range
//!
//! The state id is the id of the first allocated address. Every allocated id
//! is tracked in `ip_address_ids` so updates and deletes reach all of them.

use crate::error::{parse_id, to_object_id, ProviderError};
use crate::Meta;
use crate::util::choices::{choice, IP_ADDRESS_OBJECT_TYPE_OPTIONS, IP_ADDRESS_ROLE_OPTIONS, IP_ADDRESS_STATUS_OPTIONS};
use crate::util::{
    custom_fields_payload, custom_fields_schema, flatten_custom_fields, resolve_tags, tag_names, tags_schema,
    CUSTOM_FIELDS_KEY, TAGS_KEY,
};
use anyhow::Context;
use async_trait::async_trait;
use netbox_client::{AvailableIPRequest, IPAddress, IPAddressStatus, NetBoxClientTrait, WritableIPAddress};
use provider_sdk::schema::{AttributeType, Element, Schema, Validation};
use provider_sdk::{Resource, ResourceData, ResourceSchema};
use serde_json::Value;
use tracing::{debug, info, warn};

const VM_INTERFACE_TYPE: &str = "virtualization.vminterface";
const DEVICE_INTERFACE_TYPE: &str = "dcim.interface";

/// Upper bound on `address_count` for a single resource
pub const MAX_ADDRESS_COUNT: i64 = 1024;

const DESCRIPTION: &str = "Per [the docs](https://netbox.readthedocs.io/en/stable/models/ipam/ipaddress/):

> An IP address comprises a single host address (either IPv4 or IPv6) and its subnet mask.

This resource will retrieve the next available IP addresses from a given prefix or IP range (specified by ID)";

/// `netbox_available_ip_addresses` resource
#[derive(Debug, Default)]
pub struct AvailableIpAddresses;

/// Where the addresses get assigned, if anywhere
#[derive(Debug, Clone, PartialEq, Eq)]
struct Assignment {
    object_type: Option<String>,
    object_id: Option<u64>,
}

fn assignment(d: &ResourceData) -> Assignment {
    let vm_interface = to_object_id(d.optional_int("virtual_machine_interface_id"));
    let device_interface = to_object_id(d.optional_int("device_interface_id"));
    let interface = to_object_id(d.optional_int("interface_id"));

    match (vm_interface, device_interface, interface) {
        (Some(id), _, _) => Assignment {
            object_type: Some(VM_INTERFACE_TYPE.to_string()),
            object_id: Some(id),
        },
        (None, Some(id), _) => Assignment {
            object_type: Some(DEVICE_INTERFACE_TYPE.to_string()),
            object_id: Some(id),
        },
        (None, None, Some(id)) => Assignment {
            object_type: d.optional_string("object_type"),
            object_id: Some(id),
        },
        (None, None, None) => Assignment {
            object_type: None,
            object_id: None,
        },
    }
}

/// Ids this resource manages; the state id alone when nothing is tracked yet
fn tracked_ids(d: &ResourceData, primary: u64) -> Vec<u64> {
    let ids: Vec<u64> = d
        .get_int_list("ip_address_ids")
        .into_iter()
        .filter_map(|id| u64::try_from(id).ok())
        .collect();
    if ids.is_empty() { vec![primary] } else { ids }
}

fn status_of(d: &ResourceData) -> Result<IPAddressStatus, ProviderError> {
    match d.optional_string("status") {
        Some(status) => status.parse().map_err(ProviderError::InvalidConfig),
        None => Ok(IPAddressStatus::default()),
    }
}

impl AvailableIpAddresses {
    async fn allocate(
        &self,
        d: &ResourceData,
        client: &dyn NetBoxClientTrait,
    ) -> anyhow::Result<Vec<IPAddress>> {
        let requested = d.get_int("address_count");
        let count = usize::try_from(requested)
            .ok()
            .filter(|c| *c > 0 && requested <= MAX_ADDRESS_COUNT)
            .ok_or_else(|| {
                ProviderError::InvalidConfig(format!(
                    "address_count must be between 1 and {}, got {}",
                    MAX_ADDRESS_COUNT, requested
                ))
            })?;
        let request = AvailableIPRequest {
            vrf: to_object_id(d.optional_int("vrf_id")),
        };
        let requests = vec![request; count];

        if let Some(prefix_id) = to_object_id(d.optional_int("prefix_id")) {
            info!("Allocating {} address(es) from prefix {}", count, prefix_id);
            let ips = client
                .allocate_prefix_ips(prefix_id, &requests)
                .await
                .with_context(|| format!("allocating addresses from prefix {}", prefix_id))?;
            return Ok(ips);
        }
        if let Some(range_id) = to_object_id(d.optional_int("ip_range_id")) {
            info!("Allocating {} address(es) from IP range {}", count, range_id);
            let ips = client
                .allocate_range_ips(range_id, &requests)
                .await
                .with_context(|| format!("allocating addresses from IP range {}", range_id))?;
            return Ok(ips);
        }
        Err(ProviderError::InvalidConfig("one of prefix_id or ip_range_id must be set".to_string()).into())
    }
}

#[async_trait]
impl Resource<Meta> for AvailableIpAddresses {
    fn schema(&self) -> ResourceSchema {
        let parents = ["prefix_id", "ip_range_id"];
        ResourceSchema::new([
            ("prefix_id", Schema::int().optional().exactly_one_of(&parents)),
            ("ip_range_id", Schema::int().optional().exactly_one_of(&parents)),
            ("ip_addresses", Schema::list(Element::of(AttributeType::String)).computed()),
            (
                "ip_address_ids",
                Schema::list(Element::of(AttributeType::Int))
                    .computed()
                    .description("IDs of every allocated IP address, in allocation order"),
            ),
            (
                "address_count",
                Schema::int()
                    .optional()
                    .default_value(1)
                    .validate(Validation::int_between(1, MAX_ADDRESS_COUNT))
                    .description("The number of IP addresses to allocate"),
            ),
            ("interface_id", Schema::int().optional().required_with(&["object_type"])),
            (
                "object_type",
                choice(IP_ADDRESS_OBJECT_TYPE_OPTIONS).required_with(&["interface_id"]),
            ),
            (
                "virtual_machine_interface_id",
                Schema::int()
                    .optional()
                    .conflicts_with(&["interface_id", "device_interface_id"]),
            ),
            (
                "device_interface_id",
                Schema::int()
                    .optional()
                    .conflicts_with(&["interface_id", "virtual_machine_interface_id"]),
            ),
            ("vrf_id", Schema::int().optional()),
            ("tenant_id", Schema::int().optional()),
            ("status", choice(IP_ADDRESS_STATUS_OPTIONS).default_value("active")),
            ("dns_name", Schema::string().optional()),
            ("description", Schema::string().optional()),
            (TAGS_KEY, tags_schema()),
            ("role", choice(IP_ADDRESS_ROLE_OPTIONS)),
            (CUSTOM_FIELDS_KEY, custom_fields_schema()),
        ])
        .description(DESCRIPTION)
        .importable()
    }

    async fn create(&self, d: &mut ResourceData, client: &Meta) -> anyhow::Result<()> {
        let created = self.allocate(d, client).await?;
        let first = created
            .first()
            .ok_or_else(|| ProviderError::InvalidConfig("NetBox returned no addresses".to_string()))?;

        d.set_id(first.id.to_string());
        let addresses: Vec<String> = created.iter().map(|ip| ip.address.clone()).collect();
        let ids: Vec<u64> = created.iter().map(|ip| ip.id).collect();
        info!("Allocated {:?} (ids {:?})", addresses, ids);
        d.set("ip_addresses", addresses)?;
        d.set("ip_address_ids", ids)?;

        self.update(d, client).await
    }

    async fn read(&self, d: &mut ResourceData, client: &Meta) -> anyhow::Result<()> {
        let id = parse_id(d.id())?;
        let ip = match client.get_ip_address(id).await {
            Ok(ip) => ip,
            Err(e) if e.is_not_found() => {
                warn!("IP address {} no longer exists, removing from state", id);
                d.set_id("");
                return Ok(());
            }
            Err(e) => return Err(e).with_context(|| format!("reading IP address {}", id)),
        };

        let mut addresses = d.get_string_list("ip_addresses");
        if addresses.is_empty() {
            addresses.push(ip.address.clone());
        }
        d.set("ip_addresses", addresses)?;
        if d.get_int_list("ip_address_ids").is_empty() {
            d.set("ip_address_ids", vec![id])?;
        }

        match ip.assigned_object_id {
            Some(object_id) => {
                if d.optional_int("virtual_machine_interface_id").is_some() {
                    d.set("virtual_machine_interface_id", object_id)?;
                } else if d.optional_int("device_interface_id").is_some() {
                    d.set("device_interface_id", object_id)?;
                } else if d.optional_int("interface_id").is_some() {
                    d.set("object_type", ip.assigned_object_type.clone())?;
                    d.set("interface_id", object_id)?;
                }
            }
            None => {
                d.clear("interface_id");
                d.clear("object_type");
            }
        }

        d.set("vrf_id", ip.vrf.as_ref().map(|v| v.id))?;
        d.set("tenant_id", ip.tenant.as_ref().map(|t| t.id))?;
        if !ip.dns_name.is_empty() {
            d.set("dns_name", ip.dns_name.clone())?;
        }
        d.set("description", ip.description.clone())?;
        d.set("status", ip.status.value.as_str())?;
        d.set(TAGS_KEY, tag_names(&ip.tags))?;
        if let Some(fields) = flatten_custom_fields(&ip.custom_fields) {
            d.set(CUSTOM_FIELDS_KEY, Value::Object(fields))?;
        }
        Ok(())
    }

    async fn update(&self, d: &mut ResourceData, client: &Meta) -> anyhow::Result<()> {
        let primary = parse_id(d.id())?;
        let ids = tracked_ids(d, primary);
        let addresses = d.get_string_list("ip_addresses");

        let status = status_of(d)?;
        let assigned = assignment(d);
        let tags = resolve_tags(client, &d.get_string_list(TAGS_KEY)).await?;
        let custom_fields = custom_fields_payload(d);

        let mut kept_ids = Vec::with_capacity(ids.len());
        let mut kept_addresses = Vec::with_capacity(ids.len());
        for (i, id) in ids.iter().enumerate() {
            let address = match addresses.get(i) {
                Some(address) => address.clone(),
                None => match client.get_ip_address(*id).await {
                    Ok(ip) => ip.address,
                    Err(e) if e.is_not_found() && *id != primary => {
                        warn!("IP address {} no longer exists, no longer tracking it", id);
                        continue;
                    }
                    Err(e) => return Err(e).with_context(|| format!("reading IP address {}", id)),
                },
            };
            let request = WritableIPAddress {
                address,
                status,
                description: d.get_string("description"),
                role: d.get_string("role"),
                dns_name: d.get_string("dns_name"),
                vrf: to_object_id(d.optional_int("vrf_id")),
                tenant: to_object_id(d.optional_int("tenant_id")),
                assigned_object_type: assigned.object_type.clone(),
                assigned_object_id: assigned.object_id,
                tags: tags.clone(),
                custom_fields: custom_fields.clone(),
            };
            debug!("Updating IP address {} ({})", id, request.address);
            match client.update_ip_address(*id, &request).await {
                Ok(_) => {
                    kept_ids.push(*id);
                    kept_addresses.push(request.address);
                }
                // Secondaries deleted out of band are dropped; the primary decides existence
                Err(e) if e.is_not_found() && *id != primary => {
                    warn!("IP address {} no longer exists, no longer tracking it", id);
                }
                Err(e) => return Err(e).with_context(|| format!("updating IP address {}", id)),
            }
        }

        d.set("ip_address_ids", kept_ids)?;
        d.set("ip_addresses", kept_addresses)?;
        self.read(d, client).await
    }

    async fn delete(&self, d: &mut ResourceData, client: &Meta) -> anyhow::Result<()> {
        let primary = parse_id(d.id())?;
        let ids = tracked_ids(d, primary);

        match client.delete_ip_address(primary).await {
            Ok(()) => info!("Deleted IP address {}", primary),
            Err(e) if e.is_not_found() => {
                warn!("IP address {} was already deleted", primary);
                d.set_id("");
            }
            Err(e) => return Err(e).with_context(|| format!("deleting IP address {}", primary)),
        }

        for id in ids.into_iter().filter(|id| *id != primary) {
            match client.delete_ip_address(id).await {
                Ok(()) => info!("Deleted IP address {}", id),
                Err(e) if e.is_not_found() => warn!("IP address {} was already deleted", id),
                Err(e) => return Err(e).with_context(|| format!("deleting IP address {}", id)),
            }
        }
        Ok(())
    }
}
