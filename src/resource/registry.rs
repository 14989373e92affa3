//! Root resource registry.
//!
//! # Design Decisions
//! - Readers take an immutable snapshot (`Arc<Vec<..>>`) per resolution
//! - Writers copy, modify and atomically publish a new snapshot
//! - Two root resources with equal patterns cannot coexist

use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use thiserror::Error;

use crate::resource::descriptor::Resource;
use crate::uri::UriPattern;

/// Immutable view of the registered root resources.
pub type Snapshot = Arc<Vec<Arc<Resource>>>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("resource {new} conflicts with {existing}: both are mounted at {template}")]
    DuplicatePattern {
        existing: String,
        new: String,
        template: String,
    },
}

#[derive(Debug)]
pub struct ResourceRegistry {
    resources: ArcSwap<Vec<Arc<Resource>>>,
    write_lock: Mutex<()>,
}

impl Default for ResourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceRegistry {
    pub fn new() -> Self {
        Self {
            resources: ArcSwap::from_pointee(Vec::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Builds a registry from `resources`, failing on the first conflict.
    pub fn with_resources(
        resources: impl IntoIterator<Item = Resource>,
    ) -> Result<Self, RegistryError> {
        let registry = Self::new();
        for resource in resources {
            registry.register(resource)?;
        }
        Ok(registry)
    }

    pub fn register(&self, resource: Resource) -> Result<Arc<Resource>, RegistryError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.resources.load();
        if let Some(existing) = current.iter().find(|r| r.pattern() == resource.pattern()) {
            return Err(RegistryError::DuplicatePattern {
                existing: existing.name().to_string(),
                new: resource.name().to_string(),
                template: resource.pattern().template().to_string(),
            });
        }

        let resource = Arc::new(resource);
        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(resource.clone());
        self.resources.store(Arc::new(next));

        tracing::debug!(
            resource = %resource.name(),
            template = %resource.pattern().template(),
            regex = %resource.pattern().regex(),
            "Resource registered"
        );
        Ok(resource)
    }

    /// Removes the resource mounted at a template equivalent to `template`.
    pub fn unregister(&self, template: &str) -> Option<Arc<Resource>> {
        let pattern = UriPattern::new(template).ok()?;
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.resources.load();
        let index = current.iter().position(|r| *r.pattern() == pattern)?;

        let mut next: Vec<_> = current.iter().cloned().collect();
        let removed = next.remove(index);
        self.resources.store(Arc::new(next));

        tracing::debug!(resource = %removed.name(), "Resource unregistered");
        Some(removed)
    }

    pub fn snapshot(&self) -> Snapshot {
        self.resources.load_full()
    }

    pub fn len(&self) -> usize {
        self.resources.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
