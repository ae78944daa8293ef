//! Query utilities for NetBox API
//!
//! Provides helpers for building queries and handling pagination.

use crate::common::{HttpClient, PaginatedResponse};
use crate::error::NetBoxError;
use serde::de::DeserializeOwned;

/// Build `/api/<endpoint>/` with an optional query string
pub fn resource_path(http: &HttpClient, endpoint: &str, filters: &[(&str, &str)]) -> String {
    let path = format!("/api/{}/", endpoint);
    if filters.is_empty() {
        path
    } else {
        format!("{}?{}", path, http.build_query_string(filters))
    }
}

/// Query resources with optional filtering and pagination
pub async fn query_resources<T: DeserializeOwned>(
    http: &HttpClient,
    endpoint: &str,
    filters: &[(&str, &str)],
    fetch_all: bool,
) -> Result<Vec<T>, NetBoxError> {
    let path = resource_path(http, endpoint, filters);

    if fetch_all {
        http.fetch_all_pages(http.build_url(&path)).await
    } else {
        let response: PaginatedResponse<T> = http.get(&path).await?;
        Ok(response.results)
    }
}

/// Query a single page, keeping the envelope so callers can read `count`
pub async fn query_page<T: DeserializeOwned>(
    http: &HttpClient,
    endpoint: &str,
    filters: &[(&str, &str)],
) -> Result<PaginatedResponse<T>, NetBoxError> {
    let path = resource_path(http, endpoint, filters);
    http.get(&path).await
}
