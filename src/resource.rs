//! Resource attributes attached to emitted telemetry
//!
//! Static key/value metadata describing the instrumented application
//! (service name, version, platform descriptors). How the values are
//! derived is the embedding application's concern; this module only defines
//! the shape and makes the set available at observer-creation time.

use std::collections::BTreeMap;
use std::sync::Arc;

/// Conventional attribute keys.
pub mod keys {
    pub const SERVICE_NAME: &str = "service.name";
    pub const SERVICE_VERSION: &str = "service.version";
    pub const DEPLOYMENT_ENVIRONMENT: &str = "deployment.environment";
    pub const TELEMETRY_SDK_NAME: &str = "telemetry.sdk.name";
    pub const TELEMETRY_SDK_VERSION: &str = "telemetry.sdk.version";
    pub const TELEMETRY_SDK_LANGUAGE: &str = "telemetry.sdk.language";
    pub const OS_NAME: &str = "os.name";
    pub const OS_VERSION: &str = "os.version";
}

/// Immutable, ordered key/value metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceAttributes {
    attributes: BTreeMap<String, String>,
}

impl ResourceAttributes {
    pub fn builder() -> ResourceAttributesBuilder {
        ResourceAttributesBuilder::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct ResourceAttributesBuilder {
    attributes: BTreeMap<String, String>,
}

impl ResourceAttributesBuilder {
    /// Set one attribute. Later values for the same key win.
    pub fn put(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> ResourceAttributes {
        ResourceAttributes {
            attributes: self.attributes,
        }
    }
}

/// Supplies resource attributes to observers that need them at creation
/// time. External collaborator seam; implementations decide the content.
pub trait ResourceProvider: Send + Sync {
    fn attributes(&self) -> Arc<ResourceAttributes>;
}

/// Provider backed by a fixed, precomputed attribute set.
#[derive(Debug, Clone)]
pub struct StaticResourceProvider {
    attributes: Arc<ResourceAttributes>,
}

impl StaticResourceProvider {
    pub fn new(attributes: ResourceAttributes) -> Self {
        Self {
            attributes: Arc::new(attributes),
        }
    }
}

impl ResourceProvider for StaticResourceProvider {
    fn attributes(&self) -> Arc<ResourceAttributes> {
        Arc::clone(&self.attributes)
    }
}
