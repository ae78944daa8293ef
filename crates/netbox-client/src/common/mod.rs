//! Common utilities for NetBox API client
//!
//! Provides shared functionality used across all API modules.

pub mod query;

use crate::error::NetBoxError;
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

/// Paginated response wrapper from NetBox API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// HTTP client wrapper with authentication
pub struct HttpClient {
    client: Client,
    base_url: String,
    token: String,
}

impl HttpClient {
    /// Create a new HTTP client wrapper
    pub fn new(client: Client, base_url: String, token: String) -> Self {
        Self {
            client,
            base_url,
            token,
        }
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a full URL from a path
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// Get authorization header value
    pub fn auth_header(&self) -> String {
        format!("Token {}", self.token)
    }

    /// Map a non-success response onto a NetBoxError
    async fn check_status(verb: &str, path: &str, response: Response) -> Result<Response, NetBoxError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(match status {
            StatusCode::NOT_FOUND => {
                NetBoxError::NotFound(format!("Resource not found: {} - {}", path, body))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => NetBoxError::Authentication(
                format!("{} {} rejected: {} - {}", verb, path, status, body),
            ),
            _ => NetBoxError::Api(format!("{} {} failed: {} - {}", verb, path, status, body)),
        })
    }

    /// Decode a JSON body, keeping the start of the payload for diagnostics
    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, NetBoxError> {
        let response_text = response.text().await?;
        serde_json::from_str(&response_text).map_err(|e| {
            NetBoxError::Api(format!(
                "error decoding response body: {} - Response (first 500 chars): {}",
                e,
                response_text.chars().take(500).collect::<String>()
            ))
        })
    }

    /// Fetch all pages of a paginated response
    pub async fn fetch_all_pages<T: DeserializeOwned>(
        &self,
        mut url: String,
    ) -> Result<Vec<T>, NetBoxError> {
        let mut all_results = Vec::new();

        loop {
            debug!("Fetching page: {}", url);

            let response = self.client
                .get(&url)
                .header("Authorization", self.auth_header())
                .header("Accept", "application/json")
                .send()
                .await
                .map_err(NetBoxError::Http)?;

            let response = Self::check_status("GET", &url, response).await?;
            let page: PaginatedResponse<T> = Self::decode(response).await?;
            all_results.extend(page.results);

            match page.next {
                Some(next_url) => {
                    url = self.build_url(&next_url);
                }
                None => break,
            }
        }

        Ok(all_results)
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, NetBoxError> {
        let url = self.build_url(path);
        debug!("GET {}", url);

        let response = self.client
            .get(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(NetBoxError::Http)?;

        let response = Self::check_status("GET", path, response).await?;
        Self::decode(response).await
    }

    /// Make a POST request
    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, NetBoxError> {
        let url = self.build_url(path);
        debug!("POST {} with body: {}", url, serde_json::to_string(body).unwrap_or_default());

        let response = self.client
            .post(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(NetBoxError::Http)?;

        let response = Self::check_status("POST", path, response).await?;
        Self::decode(response).await
    }

    /// Make a PUT request
    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, NetBoxError> {
        let url = self.build_url(path);
        debug!("PUT {} with body: {}", url, serde_json::to_string(body).unwrap_or_default());

        let response = self.client
            .put(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(NetBoxError::Http)?;

        let response = Self::check_status("PUT", path, response).await?;
        Self::decode(response).await
    }

    /// Make a DELETE request
    pub async fn delete(&self, path: &str) -> Result<(), NetBoxError> {
        let url = self.build_url(path);
        debug!("DELETE {}", url);

        let response = self.client
            .delete(&url)
            .header("Authorization", self.auth_header())
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(NetBoxError::Http)?;

        Self::check_status("DELETE", path, response).await?;
        Ok(())
    }

    /// Build query string from filters
    ///
    /// Repeated keys are kept, NetBox treats them as OR filters.
    pub fn build_query_string(&self, filters: &[(&str, &str)]) -> String {
        filters
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http() -> HttpClient {
        HttpClient::new(Client::new(), "http://netbox:8000".to_string(), "abc".to_string())
    }

    #[test]
    fn build_url_prefixes_relative_paths() {
        let http = http();
        assert_eq!(http.build_url("/api/ipam/services/"), "http://netbox:8000/api/ipam/services/");
        assert_eq!(
            http.build_url("https://other/api/ipam/services/?offset=50"),
            "https://other/api/ipam/services/?offset=50"
        );
    }

    #[test]
    fn query_string_encodes_and_keeps_repeated_keys() {
        let http = http();
        let query = http.build_query_string(&[("tag", "a b"), ("tag", "c"), ("name", "dns/udp")]);
        assert_eq!(query, "tag=a%20b&tag=c&name=dns%2Fudp");
        assert_eq!(http.build_query_string(&[]), "");
    }

    #[test]
    fn auth_header_uses_token_scheme() {
        assert_eq!(http().auth_header(), "Token abc");
    }
}
