//! SDK errors

use thiserror::Error;

/// Errors raised by the SDK itself, as opposed to resource callbacks
#[derive(Debug, Error)]
pub enum SdkError {
    /// Attribute is not declared in the schema
    #[error("Invalid address to set: \"{0}\"")]
    UnknownAttribute(String),

    /// No resource registered under this type name
    #[error("unknown resource type: {0}")]
    UnknownResource(String),

    /// No data source registered under this type name
    #[error("unknown data source type: {0}")]
    UnknownDataSource(String),

    /// A lifecycle call arrived before `configure_provider`
    #[error("provider has not been configured")]
    NotConfigured,

    /// Import requested for a resource without an importer
    #[error("resource {0} doesn't support import")]
    ImportNotSupported(String),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Protocol stream error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
