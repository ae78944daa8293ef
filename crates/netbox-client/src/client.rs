//! NetBox API client
//!
//! Implements the NetBox REST API client for the IPAM operations the provider
//! needs. Based on NetBox API structure: /api/ipam/ip-addresses/,
//! /api/ipam/services/ and the `available-ips` allocation endpoints.

use crate::common::query::{query_page, query_resources};
use crate::common::HttpClient;
use crate::error::NetBoxError;
use crate::models::*;
use crate::netbox_trait::NetBoxClientTrait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, info};

/// Connection settings for [`NetBoxClient`]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// NetBox base URL (e.g., "https://netbox.example.com")
    pub base_url: String,
    /// API token for authentication
    pub token: String,
    /// Skip TLS certificate verification
    pub allow_insecure_https: bool,
    /// Per-request timeout
    pub request_timeout: Duration,
    /// Extra headers sent with every request
    pub headers: BTreeMap<String, String>,
    /// Remove trailing slashes from `base_url`
    pub strip_trailing_slashes: bool,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            allow_insecure_https: false,
            request_timeout: Duration::from_secs(10),
            headers: BTreeMap::new(),
            strip_trailing_slashes: true,
        }
    }

    /// Base URL as it will be used to build request URLs
    pub fn normalized_base_url(&self) -> String {
        if self.strip_trailing_slashes {
            self.base_url.trim_end_matches('/').to_string()
        } else {
            self.base_url.clone()
        }
    }

    fn header_map(&self) -> Result<HeaderMap, NetBoxError> {
        let mut map = HeaderMap::new();
        for (name, value) in &self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| NetBoxError::InvalidRequest(format!("invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| NetBoxError::InvalidRequest(format!("invalid value for header '{}': {}", name, e)))?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

/// NetBox API client
pub struct NetBoxClient {
    http: HttpClient,
}

impl NetBoxClient {
    /// Create a new NetBox client with default settings
    ///
    /// # Arguments
    /// * `base_url` - NetBox base URL (e.g., "http://netbox:80")
    /// * `token` - API token for authentication
    pub fn new(base_url: String, token: String) -> Result<Self, NetBoxError> {
        Self::with_config(ClientConfig::new(base_url, token))
    }

    /// Create a client from a full [`ClientConfig`]
    pub fn with_config(config: ClientConfig) -> Result<Self, NetBoxError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.allow_insecure_https)
            .default_headers(config.header_map()?)
            .build()
            .map_err(NetBoxError::Http)?;

        let base_url = config.normalized_base_url();
        info!(
            "NetBox client for {} (timeout {:?}, insecure TLS: {})",
            base_url, config.request_timeout, config.allow_insecure_https
        );

        Ok(Self {
            http: HttpClient::new(client, base_url, config.token),
        })
    }

    async fn allocate(&self, path: String, requests: &[AvailableIPRequest]) -> Result<Vec<IPAddress>, NetBoxError> {
        if requests.is_empty() {
            return Err(NetBoxError::InvalidRequest(
                "at least one address must be requested".to_string(),
            ));
        }

        debug!("Allocating {} address(es) via {}", requests.len(), path);
        let created: Vec<IPAddress> = self.http.post(&path, requests).await?;

        if created.is_empty() {
            return Err(NetBoxError::Api(format!("No IP address was created by {}", path)));
        }
        Ok(created)
    }
}

#[async_trait::async_trait]
impl NetBoxClientTrait for NetBoxClient {
    fn base_url(&self) -> &str {
        self.http.base_url()
    }

    async fn status(&self) -> Result<NetBoxStatus, NetBoxError> {
        debug!("Validating NetBox token and connectivity");
        let status: NetBoxStatus = self.http.get("/api/status/").await?;
        debug!("Connected to NetBox {}", status.netbox_version);
        Ok(status)
    }

    /// Allocate the next available addresses from a prefix
    ///
    /// NetBox creates one address per entry in `requests` and returns them in
    /// allocation order.
    async fn allocate_prefix_ips(&self, prefix_id: u64, requests: &[AvailableIPRequest]) -> Result<Vec<IPAddress>, NetBoxError> {
        self.allocate(format!("/api/ipam/prefixes/{}/available-ips/", prefix_id), requests).await
    }

    /// Allocate the next available addresses from an IP range
    async fn allocate_range_ips(&self, range_id: u64, requests: &[AvailableIPRequest]) -> Result<Vec<IPAddress>, NetBoxError> {
        self.allocate(format!("/api/ipam/ip-ranges/{}/available-ips/", range_id), requests).await
    }

    async fn get_ip_address(&self, id: u64) -> Result<IPAddress, NetBoxError> {
        debug!("Fetching IP address {} from NetBox", id);
        self.http.get(&format!("/api/ipam/ip-addresses/{}/", id)).await
    }

    async fn query_ip_addresses(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<IPAddress>, NetBoxError> {
        debug!("Querying IP addresses with filters: {:?}", filters);
        query_resources(&self.http, "ipam/ip-addresses", filters, fetch_all).await
    }

    async fn update_ip_address(&self, id: u64, request: &WritableIPAddress) -> Result<IPAddress, NetBoxError> {
        self.http.put(&format!("/api/ipam/ip-addresses/{}/", id), request).await
    }

    async fn delete_ip_address(&self, id: u64) -> Result<(), NetBoxError> {
        self.http.delete(&format!("/api/ipam/ip-addresses/{}/", id)).await
    }

    async fn query_services(&self, filters: &[(&str, &str)], limit: Option<u64>) -> Result<PaginatedResponse<Service>, NetBoxError> {
        let limit = limit.map(|l| l.to_string());
        let mut params: Vec<(&str, &str)> = filters.to_vec();
        if let Some(limit) = limit.as_deref() {
            params.push(("limit", limit));
        }
        debug!("Querying services with filters: {:?}", params);
        query_page(&self.http, "ipam/services", &params).await
    }

    async fn get_service(&self, id: u64) -> Result<Service, NetBoxError> {
        self.http.get(&format!("/api/ipam/services/{}/", id)).await
    }

    async fn create_service(&self, request: &WritableService) -> Result<Service, NetBoxError> {
        self.http.post("/api/ipam/services/", request).await
    }

    async fn update_service(&self, id: u64, request: &WritableService) -> Result<Service, NetBoxError> {
        self.http.put(&format!("/api/ipam/services/{}/", id), request).await
    }

    async fn delete_service(&self, id: u64) -> Result<(), NetBoxError> {
        self.http.delete(&format!("/api/ipam/services/{}/", id)).await
    }

    async fn query_tags(&self, filters: &[(&str, &str)], fetch_all: bool) -> Result<Vec<Tag>, NetBoxError> {
        query_resources(&self.http, "extras/tags", filters, fetch_all).await
    }
}
