//! NetBox provider
//!
//! Exposes the following types to the engine:
//!
//! - `netbox_available_ip_addresses` resource: allocates the next free
//!   addresses of a prefix or IP range and manages them as one object
//! - `netbox_service` resource
//! - `netbox_services` data source
//!
//! The meta value shared by every callback is the NetBox API client, held as
//! a trait object so tests can substitute `MockNetBoxClient`.

pub mod config;
pub mod data_sources;
pub mod error;
pub mod resources;
pub mod util;

use netbox_client::NetBoxClientTrait;
use provider_sdk::Provider;

pub use config::NetBoxConfigure;
pub use error::ProviderError;

/// Meta value handed to callbacks
pub type Meta = dyn NetBoxClientTrait;

/// Provider with every resource and data source registered
pub fn provider() -> Provider<Meta> {
    Provider::new("netbox", NetBoxConfigure)
        .resource("netbox_available_ip_addresses", resources::AvailableIpAddresses)
        .resource("netbox_service", resources::ServiceResource)
        .data_source("netbox_services", data_sources::ServicesDataSource)
}
