//! Provider-specific error types.
//!
//! Callbacks return `anyhow::Result`; these variants carry the messages users
//! see for failures that are not plain NetBox API errors.

use netbox_client::NetBoxError;
use provider_sdk::SdkError;
use thiserror::Error;

/// Errors that can occur in the NetBox provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// NetBox API error
    #[error("NetBox error: {0}")]
    NetBox(#[from] NetBoxError),

    /// Attribute map error
    #[error(transparent)]
    Sdk(#[from] SdkError),

    /// A tag name resolved to zero or several tags
    #[error("could not find tag {0}")]
    TagNotFound(String),

    /// Filter name the services data source does not know
    #[error("'{0}' is not a supported filter parameter")]
    UnsupportedFilter(String),

    /// The services query returned nothing
    #[error("no service found matching filter")]
    NoServiceFound,

    /// State id is not a NetBox object id
    #[error("invalid id {0:?}: expected a positive integer")]
    InvalidId(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Parse a state id into a NetBox object id
pub fn parse_id(id: &str) -> Result<u64, ProviderError> {
    id.parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ProviderError::InvalidId(id.to_string()))
}

/// Convert a configured integer into a NetBox object id; zero and negative
/// values mean "unset"
pub fn to_object_id(value: Option<i64>) -> Option<u64> {
    value.and_then(|v| u64::try_from(v).ok()).filter(|v| *v > 0)
}
