//! NetBox REST API Client
//!
//! A Rust client library for the parts of the NetBox REST API used by the
//! NetBox Terraform provider: IP address allocation, IP addresses, services
//! and tags.
//!
//! # Example
//!
//! ```no_run
//! use netbox_client::{AvailableIPRequest, ClientConfig, NetBoxClient, NetBoxClientTrait};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create a client
//! let client = NetBoxClient::with_config(ClientConfig::new(
//!     "http://netbox:80",
//!     "your-api-token",
//! ))?;
//!
//! // Allocate two addresses from prefix 1
//! let requests = vec![AvailableIPRequest::default(); 2];
//! let ips = client.allocate_prefix_ips(1, &requests).await?;
//!
//! // Look up services by protocol
//! let services = client.query_services(&[("protocol", "tcp")], Some(10)).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **IPAM Operations**: Allocate from prefixes and IP ranges, manage IP addresses and services
//! - **Pagination**: Support for fetching all pages of large result sets
//! - **Mocking**: `test-util` feature exposes an in-memory `MockNetBoxClient`

pub mod client;
pub mod common;
pub mod error;
pub mod models;
#[path = "trait.rs"]
pub mod netbox_trait;
#[cfg(any(test, feature = "test-util"))]
pub mod mock;

pub use client::{ClientConfig, NetBoxClient};
pub use common::{HttpClient, PaginatedResponse};
pub use error::NetBoxError;
pub use models::*;
pub use netbox_trait::NetBoxClientTrait;
#[cfg(any(test, feature = "test-util"))]
pub use mock::MockNetBoxClient;
