//! `tags` attribute: a set of tag names

use crate::error::ProviderError;
use netbox_client::{NestedTag, NetBoxClientTrait, WritableTag};
use provider_sdk::schema::{AttributeType, Element, Schema};
use tracing::debug;

/// Attribute name of the tag set
pub const TAGS_KEY: &str = "tags";

/// Optional set of tag names
pub fn tags_schema() -> Schema {
    Schema::set(Element::of(AttributeType::String)).optional()
}

/// Resolve tag names to tag references, one lookup per name
pub async fn resolve_tags(
    client: &dyn NetBoxClientTrait,
    names: &[String],
) -> Result<Vec<WritableTag>, ProviderError> {
    let mut refs = Vec::with_capacity(names.len());
    for name in names {
        let found = client.query_tags(&[("name", name.as_str())], false).await?;
        match found.as_slice() {
            [tag] => {
                debug!("Resolved tag '{}' to ID {}", name, tag.id);
                refs.push(WritableTag {
                    name: tag.name.clone(),
                    slug: tag.slug.clone(),
                });
            }
            _ => return Err(ProviderError::TagNotFound(name.clone())),
        }
    }
    Ok(refs)
}

/// Names of nested tags, in NetBox order
pub fn tag_names(tags: &[NestedTag]) -> Vec<String> {
    tags.iter().map(|t| t.name.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use netbox_client::MockNetBoxClient;

    #[tokio::test]
    async fn resolves_known_tags() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_tag("acctest", "acctest");
        mock.add_tag("Web Tier", "web-tier");

        let refs = resolve_tags(&mock, &["Web Tier".to_string(), "acctest".to_string()])
            .await
            .unwrap();
        assert_eq!(refs[0].slug, "web-tier");
        assert_eq!(refs[1].name, "acctest");
    }

    #[tokio::test]
    async fn missing_or_ambiguous_tags_fail() {
        let mock = MockNetBoxClient::new("http://test-netbox");
        mock.add_tag("dup", "dup-1");
        mock.add_tag("dup", "dup-2");

        let err = resolve_tags(&mock, &["nope".to_string()]).await.unwrap_err();
        assert_eq!(err.to_string(), "could not find tag nope");

        let err = resolve_tags(&mock, &["dup".to_string()]).await.unwrap_err();
        assert_eq!(err.to_string(), "could not find tag dup");
    }
}
