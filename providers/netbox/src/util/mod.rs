//! Helpers shared by the resources and data sources

pub mod choices;
pub mod custom_fields;
pub mod tags;

pub use custom_fields::{custom_fields_payload, custom_fields_schema, flatten_custom_fields, CUSTOM_FIELDS_KEY};
pub use tags::{resolve_tags, tag_names, tags_schema, TAGS_KEY};
