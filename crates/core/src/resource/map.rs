use std::sync::Arc;

use super::config::ResourceConfig;

/// Resources keyed by identity, in file-name order.
#[derive(Debug, Clone, Default)]
pub struct ResourceMap {
    resources: Vec<Arc<ResourceConfig>>,
}

impl ResourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a resource, handing it back if the identity is already taken.
    pub fn insert(&mut self, resource: ResourceConfig) -> Result<(), ResourceConfig> {
        if self.contains(&resource.file_prefix) {
            return Err(resource);
        }
        self.resources.push(Arc::new(resource));
        Ok(())
    }

    pub fn get(&self, identity: &str) -> Option<&Arc<ResourceConfig>> {
        self.resources
            .iter()
            .find(|resource| resource.file_prefix == identity)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.get(identity).is_some()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> {
        self.resources
            .iter()
            .map(|resource| resource.file_prefix.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Arc<ResourceConfig>> {
        self.resources.iter()
    }
}

impl<'a> IntoIterator for &'a ResourceMap {
    type Item = &'a Arc<ResourceConfig>;
    type IntoIter = std::slice::Iter<'a, Arc<ResourceConfig>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
