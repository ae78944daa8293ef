//! Extras operations for MockNetBoxClient
//!
//! Handles tags

use super::MockNetBoxClient;
use crate::error::NetBoxError;
use crate::models::*;

pub fn query_tags(client: &MockNetBoxClient, filters: &[(&str, &str)]) -> Result<Vec<Tag>, NetBoxError> {
    let tags = client.tags.lock().unwrap();
    let mut results: Vec<Tag> = tags.values().cloned().collect();
    results.sort_by_key(|t| t.id);

    for (key, value) in filters {
        match *key {
            "name" => results.retain(|t| t.name == *value),
            "slug" => results.retain(|t| t.slug == *value),
            _ => {}
        }
    }

    Ok(results)
}
