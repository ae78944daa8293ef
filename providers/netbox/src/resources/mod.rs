//! Resource types

pub mod available_ip_addresses;
pub mod service;

pub use available_ip_addresses::AvailableIpAddresses;
pub use service::ServiceResource;
