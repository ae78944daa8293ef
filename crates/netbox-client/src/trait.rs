//! NetBoxClient trait for mocking
//!
//! This trait abstracts the NetBoxClient so provider adapters can run against
//! the real API or an in-memory mock.

use crate::error::NetBoxError;
use crate::models::*;

/// Trait for NetBox API client operations
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait NetBoxClientTrait: Send + Sync {
    /// Get the base URL
    fn base_url(&self) -> &str;

    /// Fetch `/api/status/`; also proves the token is accepted
    async fn status(&self) -> Result<NetBoxStatus, NetBoxError>;

    // IPAM Operations
    async fn allocate_prefix_ips(&self, prefix_id: u64, requests: &[AvailableIPRequest]) -> Result<Vec<IPAddress>, NetBoxError>;
    async fn allocate_range_ips(&self, range_id: u64, requests: &[AvailableIPRequest]) -> Result<Vec<IPAddress>, NetBoxError>;
    async fn get_ip_address(&self, id: u64) -> Result<IPAddress, NetBoxError>;
    async fn query_ip_addresses(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<IPAddress>, NetBoxError>;
    async fn update_ip_address(&self, id: u64, request: &WritableIPAddress) -> Result<IPAddress, NetBoxError>;
    async fn delete_ip_address(&self, id: u64) -> Result<(), NetBoxError>;

    async fn query_services(&self, filters: &[(&str, &str)], limit: Option<u64>) -> Result<PaginatedResponse<Service>, NetBoxError>;
    async fn get_service(&self, id: u64) -> Result<Service, NetBoxError>;
    async fn create_service(&self, request: &WritableService) -> Result<Service, NetBoxError>;
    async fn update_service(&self, id: u64, request: &WritableService) -> Result<Service, NetBoxError>;
    async fn delete_service(&self, id: u64) -> Result<(), NetBoxError>;

    // Extras Operations
    async fn query_tags(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<Tag>, NetBoxError>;
}
