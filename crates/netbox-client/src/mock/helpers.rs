//! Helper functions for creating nested NetBox model types

use crate::models::*;

/// Helper functions for creating nested types in mock implementations
pub struct Helpers {
    base_url: String,
}

impl Helpers {
    pub fn new(base_url: String) -> Self {
        Self { base_url }
    }

    /// Helper to create NestedVrf
    pub fn create_nested_vrf(&self, id: u64) -> NestedVrf {
        let name = format!("VRF {}", id);
        NestedVrf {
            id,
            url: format!("{}/api/ipam/vrfs/{}/", self.base_url, id),
            display: name.clone(),
            name,
        }
    }

    /// Helper to create NestedTenant
    pub fn create_nested_tenant(&self, id: u64) -> NestedTenant {
        let name = format!("Tenant {}", id);
        NestedTenant {
            id,
            url: format!("{}/api/tenancy/tenants/{}/", self.base_url, id),
            display: name.clone(),
            slug: name.to_lowercase().replace(' ', "-"),
            name,
        }
    }

    /// Helper to create NestedDevice
    pub fn create_nested_device(&self, id: u64) -> NestedDevice {
        let name = format!("device-{}", id);
        NestedDevice {
            id,
            url: format!("{}/api/dcim/devices/{}/", self.base_url, id),
            display: name.clone(),
            name: Some(name),
        }
    }

    /// Helper to create NestedVirtualMachine
    pub fn create_nested_virtual_machine(&self, id: u64) -> NestedVirtualMachine {
        let name = format!("vm-{}", id);
        NestedVirtualMachine {
            id,
            url: format!("{}/api/virtualization/virtual-machines/{}/", self.base_url, id),
            display: name.clone(),
            name,
        }
    }

    /// Helper to create NestedTag from a tag reference; ids of unknown tags are 0
    pub fn create_nested_tag(&self, tag: &WritableTag, known: &[Tag]) -> NestedTag {
        let id = known
            .iter()
            .find(|t| t.slug == tag.slug)
            .map(|t| t.id)
            .unwrap_or(0);
        NestedTag {
            id,
            url: format!("{}/api/extras/tags/{}/", self.base_url, id),
            display: tag.name.clone(),
            name: tag.name.clone(),
            slug: tag.slug.clone(),
        }
    }

    /// Helper to convert tag references to NestedTag values
    pub fn convert_tags(&self, tags: &[WritableTag], known: &[Tag]) -> Vec<NestedTag> {
        tags.iter()
            .map(|t| self.create_nested_tag(t, known))
            .collect()
    }
}
