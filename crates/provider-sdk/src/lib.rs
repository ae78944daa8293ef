//! Provider SDK
//!
//! The pieces an infrastructure-as-code provider plugin is built from:
//!
//! - [`schema`]: attribute types, flags and validators
//! - [`validation`]: configuration checks and defaults
//! - [`ResourceData`]: the attribute map handed to every callback
//! - [`Resource`], [`DataSource`], [`Configure`] and the [`Provider`] registry
//! - [`serve`]: the line-delimited JSON protocol spoken over stdin/stdout

pub mod data;
pub mod diagnostics;
pub mod error;
pub mod provider;
pub mod schema;
pub mod server;
pub mod validation;

pub use data::ResourceData;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::SdkError;
pub use provider::{Configure, DataSource, Outcome, Provider, ProviderSchema, Resource};
pub use schema::{
    build_valid_value_description, AttributeType, Element, ResourceSchema, Schema, SchemaMap,
    Validation,
};
pub use server::{serve, serve_stdio, PROTOCOL_VERSION};
pub use validation::{apply_defaults, validate_config, Config};
