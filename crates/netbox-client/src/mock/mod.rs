//! Mock NetBoxClient for unit testing
//!
//! This module provides a mock implementation of NetBoxClientTrait that can be used
//! in unit tests without requiring a running NetBox instance.
//!
//! The mock is organized into domain-specific modules:
//! - `ipam.rs` - IPAM operations (address allocation, IP addresses, services)
//! - `extras.rs` - Extras operations (tags)
//! - `helpers.rs` - Helper functions for creating nested types

mod helpers;
mod ipam;
mod extras;

use crate::error::NetBoxError;
use crate::models::*;
use crate::netbox_trait::NetBoxClientTrait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Mock NetBoxClient for testing
///
/// This mock stores resources in memory. Prefixes and IP ranges are modelled as
/// queues of free addresses; allocation pops from the front like NetBox hands
/// out the lowest free address first.
#[derive(Clone)]
pub struct MockNetBoxClient {
    pub(crate) base_url: String,
    pub(crate) version: String,
    // In-memory storage for resources
    pub(crate) ip_addresses: Arc<Mutex<HashMap<u64, IPAddress>>>,
    pub(crate) prefix_pools: Arc<Mutex<HashMap<u64, VecDeque<String>>>>,
    pub(crate) range_pools: Arc<Mutex<HashMap<u64, VecDeque<String>>>>,
    pub(crate) services: Arc<Mutex<HashMap<u64, Service>>>,
    pub(crate) tags: Arc<Mutex<HashMap<u64, Tag>>>,
    // When set, the service list endpoint answers 404
    pub(crate) services_unavailable: Arc<AtomicBool>,
    // Counter for generating IDs
    pub(crate) next_id: Arc<Mutex<u64>>,
}

impl MockNetBoxClient {
    /// Create a new mock client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            version: "4.1.3".to_string(),
            ip_addresses: Arc::new(Mutex::new(HashMap::new())),
            prefix_pools: Arc::new(Mutex::new(HashMap::new())),
            range_pools: Arc::new(Mutex::new(HashMap::new())),
            services: Arc::new(Mutex::new(HashMap::new())),
            tags: Arc::new(Mutex::new(HashMap::new())),
            services_unavailable: Arc::new(AtomicBool::new(false)),
            next_id: Arc::new(Mutex::new(1)),
        }
    }

    /// Make `query_services` answer 404, as a NetBox without the endpoint would
    pub fn set_services_unavailable(&self, unavailable: bool) {
        self.services_unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Report a different NetBox version from `status()`
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Register a prefix with the given free addresses (for test setup)
    pub fn add_prefix_pool(&self, prefix_id: u64, free: &[&str]) {
        self.prefix_pools
            .lock()
            .unwrap()
            .insert(prefix_id, free.iter().map(|s| s.to_string()).collect());
    }

    /// Register an IP range with the given free addresses (for test setup)
    pub fn add_range_pool(&self, range_id: u64, free: &[&str]) {
        self.range_pools
            .lock()
            .unwrap()
            .insert(range_id, free.iter().map(|s| s.to_string()).collect());
    }

    /// Add an IP address to the mock store (for test setup)
    pub fn add_ip_address(&self, ip: IPAddress) {
        self.ip_addresses.lock().unwrap().insert(ip.id, ip);
    }

    /// Drop an IP address behind the provider's back
    pub fn remove_ip_address(&self, id: u64) -> Option<IPAddress> {
        self.ip_addresses.lock().unwrap().remove(&id)
    }

    /// Add a service to the mock store (for test setup)
    pub fn add_service(&self, service: Service) {
        self.services.lock().unwrap().insert(service.id, service);
    }

    /// Add a tag to the mock store, returning it (for test setup)
    pub fn add_tag(&self, name: &str, slug: &str) -> Tag {
        let id = self.next_id();
        let tag = Tag {
            id,
            url: format!("{}/api/extras/tags/{}/", self.base_url, id),
            display: name.to_string(),
            name: name.to_string(),
            slug: slug.to_string(),
            color: "9e9e9e".to_string(),
            description: String::new(),
        };
        self.tags.lock().unwrap().insert(id, tag.clone());
        tag
    }

    /// Snapshot of a stored IP address (for assertions)
    pub fn ip_address(&self, id: u64) -> Option<IPAddress> {
        self.ip_addresses.lock().unwrap().get(&id).cloned()
    }

    /// Number of stored IP addresses (for assertions)
    pub fn ip_address_count(&self) -> usize {
        self.ip_addresses.lock().unwrap().len()
    }

    /// Snapshot of a stored service (for assertions)
    pub fn service(&self, id: u64) -> Option<Service> {
        self.services.lock().unwrap().get(&id).cloned()
    }

    /// Generate next ID
    pub(crate) fn next_id(&self) -> u64 {
        let mut id = self.next_id.lock().unwrap();
        let current = *id;
        *id += 1;
        current
    }

    /// Get helpers instance
    pub(crate) fn helpers(&self) -> helpers::Helpers {
        helpers::Helpers::new(self.base_url.clone())
    }
}

#[async_trait::async_trait]
impl NetBoxClientTrait for MockNetBoxClient {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn status(&self) -> Result<NetBoxStatus, NetBoxError> {
        Ok(NetBoxStatus {
            netbox_version: self.version.clone(),
            python_version: Some("3.12.3".to_string()),
        })
    }

    // IPAM Operations - delegated to ipam module
    async fn allocate_prefix_ips(&self, prefix_id: u64, requests: &[AvailableIPRequest]) -> Result<Vec<IPAddress>, NetBoxError> {
        ipam::allocate(self, &self.prefix_pools, "Prefix", prefix_id, requests)
    }

    async fn allocate_range_ips(&self, range_id: u64, requests: &[AvailableIPRequest]) -> Result<Vec<IPAddress>, NetBoxError> {
        ipam::allocate(self, &self.range_pools, "IP range", range_id, requests)
    }

    async fn get_ip_address(&self, id: u64) -> Result<IPAddress, NetBoxError> {
        ipam::get_ip_address(self, id)
    }

    async fn query_ip_addresses(&self, filters: &[(&str, &str)], _fetch_all: bool) -> Result<Vec<IPAddress>, NetBoxError> {
        ipam::query_ip_addresses(self, filters)
    }

    async fn update_ip_address(&self, id: u64, request: &WritableIPAddress) -> Result<IPAddress, NetBoxError> {
        ipam::update_ip_address(self, id, request)
    }

    async fn delete_ip_address(&self, id: u64) -> Result<(), NetBoxError> {
        ipam::delete_ip_address(self, id)
    }

    async fn query_services(&self, filters: &[(&str, &str)], limit: Option<u64>) -> Result<PaginatedResponse<Service>, NetBoxError> {
        ipam::query_services(self, filters, limit)
    }

    async fn get_service(&self, id: u64) -> Result<Service, NetBoxError> {
        ipam::get_service(self, id)
    }

    async fn create_service(&self, request: &WritableService) -> Result<Service, NetBoxError> {
        ipam::create_service(self, request)
    }

    async fn update_service(&self, id: u64, request: &WritableService) -> Result<Service, NetBoxError> {
        ipam::update_service(self, id, request)
    }

    async fn delete_service(&self, id: u64) -> Result<(), NetBoxError> {
        ipam::delete_service(self, id)
    }

    // Extras Operations - delegated to extras module
    async fn query_tags(&self, filters: &[(&str, &str)], _fetch_all: bool) -> Result<Vec<Tag>, NetBoxError> {
        extras::query_tags(self, filters)
    }
}
