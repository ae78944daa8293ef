//! NetBox API models
//!
//! These models match the NetBox REST API serializers.
//! See: netbox/netbox/ipam/api/serializers_/ip.py and services.py

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use crate::common::PaginatedResponse;

/// Choice field as rendered by NetBox (`{"value": "active", "label": "Active"}`)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChoiceField<T> {
    pub value: T,
    #[serde(default)]
    pub label: String,
}

impl<T> ChoiceField<T> {
    pub fn new(value: T, label: impl Into<String>) -> Self {
        Self {
            value,
            label: label.into(),
        }
    }
}

/// IP Address model matching NetBox IPAddressSerializer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct IPAddress {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub display: String,
    pub address: String, // e.g., "192.168.1.1/24"
    pub vrf: Option<NestedVrf>,
    pub tenant: Option<NestedTenant>,
    pub status: ChoiceField<IPAddressStatus>,
    #[serde(default)]
    pub role: Option<ChoiceField<String>>,
    #[serde(default)]
    pub assigned_object_type: Option<String>,
    #[serde(default)]
    pub assigned_object_id: Option<u64>,
    #[serde(default)]
    pub dns_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<NestedTag>,
    #[serde(default)]
    pub custom_fields: serde_json::Value,
    #[serde(default)]
    pub created: Option<String>, // ISO 8601 datetime
    #[serde(default)]
    pub last_updated: Option<String>, // ISO 8601 datetime
}

/// One entry of the request list posted to an `available-ips` endpoint.
///
/// NetBox picks the address; the payload only carries optional defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AvailableIPRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vrf: Option<u64>,
}

/// Request body for updating (PUT) an IP address
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WritableIPAddress {
    pub address: String,
    pub status: IPAddressStatus,
    pub description: String,
    pub role: String,
    pub dns_name: String,
    pub vrf: Option<u64>,
    pub tenant: Option<u64>,
    pub assigned_object_type: Option<String>,
    pub assigned_object_id: Option<u64>,
    pub tags: Vec<WritableTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<serde_json::Value>,
}

/// Service model matching NetBox ServiceSerializer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Service {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub display: String,
    #[serde(default)]
    pub device: Option<NestedDevice>,
    #[serde(default)]
    pub virtual_machine: Option<NestedVirtualMachine>,
    pub name: String,
    pub protocol: ChoiceField<String>,
    #[serde(default)]
    pub ports: Vec<u32>,
    #[serde(default)]
    pub ipaddresses: Vec<NestedIPAddress>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<NestedTag>,
    #[serde(default)]
    pub custom_fields: serde_json::Value,
}

/// Request body for creating or updating a service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WritableService {
    pub name: String,
    pub device: Option<u64>,
    pub virtual_machine: Option<u64>,
    pub protocol: String,
    pub ports: Vec<u32>,
    pub description: String,
    pub tags: Vec<WritableTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_fields: Option<serde_json::Value>,
}

/// Tag model (from extras API)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Tag {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub display: String,
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: String,
}

/// Tag reference accepted by writable serializers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WritableTag {
    pub name: String,
    pub slug: String,
}

/// Response of `GET /api/status/`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetBoxStatus {
    #[serde(rename = "netbox-version")]
    pub netbox_version: String,
    #[serde(rename = "python-version", default)]
    pub python_version: Option<String>,
}

// Nested serializers (simplified versions for references)

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NestedVrf {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub display: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NestedTenant {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub display: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NestedTag {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub display: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NestedIPAddress {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub display: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NestedDevice {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub display: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NestedVirtualMachine {
    pub id: u64,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub display: String,
    #[serde(default)]
    pub name: String,
}

/// IP Address status choices
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum IPAddressStatus {
    #[default]
    Active,
    Reserved,
    Deprecated,
    Dhcp,
    #[serde(rename = "slaac")]
    Slaac,
}

impl IPAddressStatus {
    /// All values in the order NetBox lists them
    pub const ALL: [IPAddressStatus; 5] = [
        IPAddressStatus::Active,
        IPAddressStatus::Reserved,
        IPAddressStatus::Deprecated,
        IPAddressStatus::Dhcp,
        IPAddressStatus::Slaac,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IPAddressStatus::Active => "active",
            IPAddressStatus::Reserved => "reserved",
            IPAddressStatus::Deprecated => "deprecated",
            IPAddressStatus::Dhcp => "dhcp",
            IPAddressStatus::Slaac => "slaac",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IPAddressStatus::Active => "Active",
            IPAddressStatus::Reserved => "Reserved",
            IPAddressStatus::Deprecated => "Deprecated",
            IPAddressStatus::Dhcp => "DHCP",
            IPAddressStatus::Slaac => "SLAAC",
        }
    }
}

impl fmt::Display for IPAddressStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IPAddressStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IPAddressStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown IP address status '{}'", s))
    }
}
