//! Provider block: connection settings and the NetBox version check

use crate::error::ProviderError;
use async_trait::async_trait;
use netbox_client::{ClientConfig, NetBoxClient, NetBoxClientTrait};
use provider_sdk::schema::{AttributeType, Element, Schema, Validation};
use provider_sdk::{Configure, Diagnostics, ResourceData, ResourceSchema};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// NetBox releases the provider is tested against
pub const SUPPORTED_VERSIONS: &[&str] = &[
    "4.0.0", "4.0.1", "4.0.2", "4.0.3", "4.0.5", "4.0.6", "4.0.7", "4.0.8", "4.0.9", "4.0.10", "4.0.11",
    "4.1.0", "4.1.1", "4.1.2", "4.1.3", "4.1.4", "4.1.5", "4.1.6", "4.1.7", "4.1.8", "4.1.10", "4.1.11",
];

const DEFAULT_REQUEST_TIMEOUT_SECS: i64 = 10;

/// Builds the NetBox API client from the provider block
#[derive(Debug, Default)]
pub struct NetBoxConfigure;

#[async_trait]
impl Configure<dyn NetBoxClientTrait> for NetBoxConfigure {
    fn schema(&self) -> ResourceSchema {
        ResourceSchema::new([
            (
                "server_url",
                Schema::string()
                    .required()
                    .env_default("NETBOX_SERVER_URL")
                    .description(
                        "Location of Netbox server including scheme (http or https) and optional port. \
                         Can be set via the `NETBOX_SERVER_URL` environment variable.",
                    ),
            ),
            (
                "api_token",
                Schema::string()
                    .required()
                    .sensitive()
                    .env_default("NETBOX_API_TOKEN")
                    .description(
                        "Netbox API authentication token. Can be set via the `NETBOX_API_TOKEN` environment variable.",
                    ),
            ),
            (
                "allow_insecure_https",
                Schema::bool()
                    .optional()
                    .env_default("NETBOX_ALLOW_INSECURE_HTTPS")
                    .default_value(false)
                    .description("Flag to set whether to allow https with invalid certificates."),
            ),
            (
                "headers",
                Schema::map(Element::of(AttributeType::String))
                    .optional()
                    .description("Set these header on all requests to Netbox."),
            ),
            (
                "request_timeout",
                Schema::int()
                    .optional()
                    .env_default("NETBOX_REQUEST_TIMEOUT")
                    .default_value(DEFAULT_REQUEST_TIMEOUT_SECS)
                    .validate(Validation::int_at_least(1))
                    .description("Netbox API HTTP request timeout in seconds."),
            ),
            (
                "skip_version_check",
                Schema::bool()
                    .optional()
                    .env_default("NETBOX_SKIP_VERSION_CHECK")
                    .default_value(false)
                    .description(
                        "If true, do not try to determine the running Netbox version at provider startup.",
                    ),
            ),
            (
                "strip_trailing_slashes_from_url",
                Schema::bool()
                    .optional()
                    .env_default("NETBOX_STRIP_TRAILING_SLASHES_FROM_URL")
                    .default_value(true)
                    .description("If true, strip trailing slashes from the `server_url` parameter."),
            ),
        ])
    }

    async fn configure(
        &self,
        d: &ResourceData,
        diags: &mut Diagnostics,
    ) -> anyhow::Result<Arc<dyn NetBoxClientTrait>> {
        let config = client_config(d)?;
        info!("Connecting to NetBox at {}", config.normalized_base_url());

        let client: Arc<dyn NetBoxClientTrait> = Arc::new(NetBoxClient::with_config(config)?);
        if d.get_bool("skip_version_check") {
            info!("Skipping NetBox version check");
        } else {
            check_version(client.as_ref(), diags).await?;
        }
        Ok(client)
    }
}

/// Map the provider block onto client settings
pub fn client_config(d: &ResourceData) -> Result<ClientConfig, ProviderError> {
    let server_url = d.get_string("server_url");
    if server_url.is_empty() {
        return Err(ProviderError::InvalidConfig("server_url must not be empty".to_string()));
    }

    let timeout = d
        .optional_int("request_timeout")
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS);
    let timeout = u64::try_from(timeout)
        .ok()
        .filter(|t| *t > 0)
        .ok_or_else(|| ProviderError::InvalidConfig(format!("request_timeout must be at least 1, got {}", timeout)))?;

    let mut config = ClientConfig::new(server_url, d.get_string("api_token"));
    config.allow_insecure_https = d.get_bool("allow_insecure_https");
    config.request_timeout = Duration::from_secs(timeout);
    config.headers = d.get_string_map("headers").into_iter().collect();
    config.strip_trailing_slashes = d.get_bool("strip_trailing_slashes_from_url");
    Ok(config)
}

/// `4.1.3-Docker-3.0.2` → `4.1.3`
fn release_of(version: &str) -> &str {
    version.split('-').next().unwrap_or(version)
}

/// Fetch the running version and warn when it has not been tested
pub async fn check_version(
    client: &dyn NetBoxClientTrait,
    diags: &mut Diagnostics,
) -> Result<(), ProviderError> {
    let status = client.status().await?;
    let version = release_of(&status.netbox_version);
    if SUPPORTED_VERSIONS.contains(&version) {
        info!("NetBox version {} is supported", version);
        return Ok(());
    }

    warn!("NetBox version {} is not in the tested list", status.netbox_version);
    diags.warning(
        "Possibly unsupported Netbox version",
        format!(
            "Your Netbox version is v{}. The provider was successfully tested against the following versions:\n\n  {}\n\nUnexpected errors may occur.",
            status.netbox_version,
            SUPPORTED_VERSIONS.join(", ")
        ),
    );
    Ok(())
}
