//! IPAM operations for MockNetBoxClient
//!
//! Handles available-IP allocation, IP addresses and services

use super::MockNetBoxClient;
use crate::error::NetBoxError;
use crate::models::*;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

pub fn allocate(
    client: &MockNetBoxClient,
    pools: &Mutex<HashMap<u64, VecDeque<String>>>,
    kind: &str,
    parent_id: u64,
    requests: &[AvailableIPRequest],
) -> Result<Vec<IPAddress>, NetBoxError> {
    let mut pools = pools.lock().unwrap();
    let pool = pools
        .get_mut(&parent_id)
        .ok_or_else(|| NetBoxError::NotFound(format!("{} {} not found", kind, parent_id)))?;

    // NetBox rejects the whole request when the pool cannot satisfy it
    if pool.len() < requests.len() {
        return Err(NetBoxError::Api(format!(
            "POST available-ips failed: 409 Conflict - An insufficient number of IP addresses are available within {} {} ({} requested, {} available)",
            kind,
            parent_id,
            requests.len(),
            pool.len()
        )));
    }

    let now = chrono::Utc::now().to_rfc3339();
    let mut created = Vec::with_capacity(requests.len());
    for request in requests {
        let Some(address) = pool.pop_front() else {
            break;
        };
        let id = client.next_id();
        let ip = IPAddress {
            id,
            url: format!("{}/api/ipam/ip-addresses/{}/", client.base_url, id),
            display: address.clone(),
            address,
            vrf: request.vrf.map(|vrf| client.helpers().create_nested_vrf(vrf)),
            tenant: None,
            status: ChoiceField::new(IPAddressStatus::Active, IPAddressStatus::Active.label()),
            role: None,
            assigned_object_type: None,
            assigned_object_id: None,
            dns_name: String::new(),
            description: String::new(),
            tags: vec![],
            custom_fields: serde_json::json!({}),
            created: Some(now.clone()),
            last_updated: Some(now.clone()),
        };
        created.push(ip);
    }

    let mut ips = client.ip_addresses.lock().unwrap();
    for ip in &created {
        ips.insert(ip.id, ip.clone());
    }
    Ok(created)
}

pub fn get_ip_address(client: &MockNetBoxClient, id: u64) -> Result<IPAddress, NetBoxError> {
    client.ip_addresses
        .lock()
        .unwrap()
        .get(&id)
        .cloned()
        .ok_or_else(|| NetBoxError::NotFound(format!("IP address {} not found", id)))
}

pub fn query_ip_addresses(client: &MockNetBoxClient, filters: &[(&str, &str)]) -> Result<Vec<IPAddress>, NetBoxError> {
    let ips = client.ip_addresses.lock().unwrap();
    let mut results: Vec<IPAddress> = ips.values().cloned().collect();
    results.sort_by_key(|ip| ip.id);

    // Apply filters (simplified - address and tag only)
    for (key, value) in filters {
        match *key {
            "address" => results.retain(|ip| ip.address == *value),
            "tag" => results.retain(|ip| ip.tags.iter().any(|t| t.slug == *value)),
            _ => {}
        }
    }

    Ok(results)
}

pub fn update_ip_address(client: &MockNetBoxClient, id: u64, request: &WritableIPAddress) -> Result<IPAddress, NetBoxError> {
    let known_tags: Vec<Tag> = client.tags.lock().unwrap().values().cloned().collect();
    let helpers = client.helpers();

    let mut ips = client.ip_addresses.lock().unwrap();
    let ip = ips
        .get_mut(&id)
        .ok_or_else(|| NetBoxError::NotFound(format!("IP address {} not found", id)))?;

    ip.address = request.address.clone();
    ip.display = request.address.clone();
    ip.status = ChoiceField::new(request.status, request.status.label());
    ip.description = request.description.clone();
    ip.dns_name = request.dns_name.clone();
    ip.role = if request.role.is_empty() {
        None
    } else {
        Some(ChoiceField::new(request.role.clone(), request.role.clone()))
    };
    ip.vrf = request.vrf.map(|vrf| helpers.create_nested_vrf(vrf));
    ip.tenant = request.tenant.map(|tenant| helpers.create_nested_tenant(tenant));
    ip.assigned_object_type = request.assigned_object_type.clone().filter(|t| !t.is_empty());
    ip.assigned_object_id = request.assigned_object_id;
    ip.tags = helpers.convert_tags(&request.tags, &known_tags);
    if let Some(custom_fields) = &request.custom_fields {
        ip.custom_fields = custom_fields.clone();
    }
    ip.last_updated = Some(chrono::Utc::now().to_rfc3339());

    Ok(ip.clone())
}

pub fn delete_ip_address(client: &MockNetBoxClient, id: u64) -> Result<(), NetBoxError> {
    client.ip_addresses
        .lock()
        .unwrap()
        .remove(&id)
        .ok_or_else(|| NetBoxError::NotFound(format!("IP address {} not found", id)))
        .map(|_| ())
}

pub fn query_services(
    client: &MockNetBoxClient,
    filters: &[(&str, &str)],
    limit: Option<u64>,
) -> Result<PaginatedResponse<Service>, NetBoxError> {
    if client.services_unavailable.load(std::sync::atomic::Ordering::SeqCst) {
        return Err(NetBoxError::NotFound("/api/ipam/services/".to_string()));
    }
    let services = client.services.lock().unwrap();
    let mut results: Vec<Service> = services.values().cloned().collect();
    results.sort_by_key(|s| s.id);

    for (key, value) in filters {
        match *key {
            "name" => results.retain(|s| s.name == *value),
            "protocol" => results.retain(|s| s.protocol.value == *value),
            // Repeated tag filters are ANDed, like NetBox does
            "tag" => results.retain(|s| s.tags.iter().any(|t| t.slug == *value)),
            other => {
                return Err(NetBoxError::Api(format!(
                    "GET /api/ipam/services/ failed: 400 Bad Request - unknown filter '{}'",
                    other
                )))
            }
        }
    }

    let count = results.len() as u64;
    if let Some(limit) = limit.filter(|l| *l > 0) {
        results.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
    }

    Ok(PaginatedResponse {
        count,
        next: None,
        previous: None,
        results,
    })
}

pub fn get_service(client: &MockNetBoxClient, id: u64) -> Result<Service, NetBoxError> {
    client.services
        .lock()
        .unwrap()
        .get(&id)
        .cloned()
        .ok_or_else(|| NetBoxError::NotFound(format!("Service {} not found", id)))
}

fn build_service(client: &MockNetBoxClient, id: u64, request: &WritableService) -> Result<Service, NetBoxError> {
    if request.device.is_some() == request.virtual_machine.is_some() {
        return Err(NetBoxError::Api(
            "POST /api/ipam/services/ failed: 400 Bad Request - A service must be associated with either a device or a virtual machine.".to_string(),
        ));
    }

    let known_tags: Vec<Tag> = client.tags.lock().unwrap().values().cloned().collect();
    let helpers = client.helpers();
    Ok(Service {
        id,
        url: format!("{}/api/ipam/services/{}/", client.base_url, id),
        display: format!("{} ({})", request.name, request.protocol.to_uppercase()),
        device: request.device.map(|d| helpers.create_nested_device(d)),
        virtual_machine: request.virtual_machine.map(|vm| helpers.create_nested_virtual_machine(vm)),
        name: request.name.clone(),
        protocol: ChoiceField::new(request.protocol.clone(), request.protocol.to_uppercase()),
        ports: request.ports.clone(),
        ipaddresses: vec![],
        description: request.description.clone(),
        tags: helpers.convert_tags(&request.tags, &known_tags),
        custom_fields: request.custom_fields.clone().unwrap_or_else(|| serde_json::json!({})),
    })
}

pub fn create_service(client: &MockNetBoxClient, request: &WritableService) -> Result<Service, NetBoxError> {
    let id = client.next_id();
    let service = build_service(client, id, request)?;
    client.services.lock().unwrap().insert(id, service.clone());
    Ok(service)
}

pub fn update_service(client: &MockNetBoxClient, id: u64, request: &WritableService) -> Result<Service, NetBoxError> {
    let existing = get_service(client, id)?;
    let mut service = build_service(client, id, request)?;
    service.ipaddresses = existing.ipaddresses;
    client.services.lock().unwrap().insert(id, service.clone());
    Ok(service)
}

pub fn delete_service(client: &MockNetBoxClient, id: u64) -> Result<(), NetBoxError> {
    client.services
        .lock()
        .unwrap()
        .remove(&id)
        .ok_or_else(|| NetBoxError::NotFound(format!("Service {} not found", id)))
        .map(|_| ())
}
