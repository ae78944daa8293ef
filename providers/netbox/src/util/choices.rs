//! Allowed values of NetBox choice fields

use provider_sdk::schema::{build_valid_value_description, Schema, Validation};

/// IP address `status` values
pub const IP_ADDRESS_STATUS_OPTIONS: &[&str] = &["active", "reserved", "deprecated", "dhcp", "slaac"];

/// IP address `role` values
pub const IP_ADDRESS_ROLE_OPTIONS: &[&str] = &[
    "loopback",
    "secondary",
    "anycast",
    "vip",
    "vrrp",
    "hsrp",
    "glbp",
    "carp",
];

/// Object types an IP address can be assigned to
pub const IP_ADDRESS_OBJECT_TYPE_OPTIONS: &[&str] = &["dcim.interface", "virtualization.vminterface"];

/// Service `protocol` values
pub const SERVICE_PROTOCOL_OPTIONS: &[&str] = &["tcp", "udp", "sctp"];

/// Optional string attribute restricted to `options`, described accordingly
pub fn choice(options: &[&str]) -> Schema {
    Schema::string()
        .optional()
        .validate(Validation::string_in_slice(options, false))
        .description(build_valid_value_description(options))
}
