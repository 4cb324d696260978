//! Provider, resource and data source traits

use crate::action::{ApplyResult, Plan};
use crate::error::{CloudError, Result};
use crate::schema::{Attributes, Schema};
use crate::state::{ProviderState, ResourceState};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Provider abstraction trait
///
/// A provider owns a set of resource types and reconciles the desired
/// [`ResourceSet`] against its slice of the state file.
#[async_trait]
pub trait CloudProvider: Send + Sync {
    /// Returns the provider name used in state keys (e.g., "prisma-postgres")
    fn name(&self) -> &str;

    /// Returns the provider display name for UI
    fn display_name(&self) -> &str;

    /// Check if the provider is properly configured and authenticated
    async fn check_auth(&self) -> Result<AuthStatus>;

    /// Re-read every resource in state
    ///
    /// Resources that no longer exist remotely are removed from `state`;
    /// their keys are returned.
    async fn refresh(&self, state: &mut ProviderState) -> Result<Vec<String>>;

    /// Calculate the actions turning `state` into `desired`
    async fn plan(&self, desired: &ResourceSet, state: &ProviderState) -> Result<Plan>;

    /// Apply the planned actions, recording results into `state`
    async fn apply(
        &self,
        plan: &Plan,
        desired: &ResourceSet,
        state: &mut ProviderState,
    ) -> Result<ApplyResult>;

    /// Adopt an existing remote resource under a logical name
    async fn import(
        &self,
        resource_type: &str,
        name: &str,
        id: &str,
        state: &mut ProviderState,
    ) -> Result<ResourceState>;

    /// Destroy one resource by key (`<type>:<name>`)
    async fn destroy(&self, key: &str, state: &mut ProviderState) -> Result<()>;

    /// Destroy every resource in state
    async fn destroy_all(&self, state: &mut ProviderState) -> Result<ApplyResult>;
}

/// A managed resource type
///
/// Implementations translate between attribute maps and remote API calls.
/// They hold no state of their own.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Type name used in configuration and state keys (e.g., "database")
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    /// Create the remote resource and return its full attributes
    async fn create(&self, config: &Attributes) -> Result<Attributes>;

    /// Refresh attributes from the remote side
    ///
    /// `Ok(None)` means the resource is gone and should leave state.
    async fn read(&self, state: &Attributes) -> Result<Option<Attributes>>;

    /// In-place update
    ///
    /// Not supported unless a resource overrides it.
    async fn update(&self, _config: &Attributes, _state: &Attributes) -> Result<Attributes> {
        Err(CloudError::UpdateNotSupported(self.type_name().to_string()))
    }

    /// Delete the remote resource; an already deleted resource is success
    async fn delete(&self, state: &Attributes) -> Result<()>;

    /// Build attributes for an existing resource from an import identifier
    async fn import(&self, id: &str) -> Result<Attributes>;
}

/// A read-only lookup
#[async_trait]
pub trait DataSource: Send + Sync {
    fn type_name(&self) -> &'static str;

    fn schema(&self) -> Schema;

    async fn read(&self) -> Result<Attributes>;
}

/// Authentication status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,

    /// Account/user information if available
    pub account_info: Option<String>,

    /// Error message if not authenticated
    pub error: Option<String>,
}

impl AuthStatus {
    pub fn ok(account_info: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            account_info: Some(account_info.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            account_info: None,
            error: Some(error.into()),
        }
    }
}

/// Desired resources, keyed by `<type>:<name>`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceSet {
    pub resources: BTreeMap<String, ResourceConfig>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a resource, returning the one it replaced
    pub fn add(&mut self, resource: ResourceConfig) -> Option<ResourceConfig> {
        self.resources.insert(resource.key(), resource)
    }

    pub fn get(&self, resource_type: &str, name: &str) -> Option<&ResourceConfig> {
        self.resources.get(&resource_key(resource_type, name))
    }

    pub fn contains(&self, resource_type: &str, name: &str) -> bool {
        self.get(resource_type, name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceConfig> {
        self.resources.values()
    }

    pub fn by_type(&self, resource_type: &str) -> Vec<&ResourceConfig> {
        self.resources
            .values()
            .filter(|r| r.resource_type == resource_type)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Key of a resource within one provider: `<type>:<name>`
pub fn resource_key(resource_type: &str, name: &str) -> String {
    format!("{}:{}", resource_type, name)
}

/// Reference to an attribute of another declared resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub resource_type: String,
    pub name: String,
    pub attribute: String,
}

impl ResourceRef {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        attribute: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            attribute: attribute.into(),
        }
    }

    /// Key of the referenced resource
    pub fn key(&self) -> String {
        resource_key(&self.resource_type, &self.name)
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.resource_type, self.name, self.attribute)
    }
}

/// Desired configuration of one resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Resource type (e.g., "project", "database")
    pub resource_type: String,

    /// Logical name
    pub name: String,

    pub provider: String,

    /// Literal attribute values
    pub config: Attributes,

    /// Attributes whose value comes from another resource
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub references: BTreeMap<String, ResourceRef>,
}

impl ResourceConfig {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            provider: provider.into(),
            config: Attributes::new(),
            references: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.config.insert(key.into(), value);
        self
    }

    pub fn with_reference(mut self, key: impl Into<String>, reference: ResourceRef) -> Self {
        self.references.insert(key.into(), reference);
        self
    }

    /// Get the full resource key (type:name)
    pub fn key(&self) -> String {
        resource_key(&self.resource_type, &self.name)
    }

    /// Get a configuration value as a specific type
    pub fn get_config<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.config
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Keys of the resources this one depends on
    pub fn dependencies(&self) -> Vec<String> {
        self.references.values().map(ResourceRef::key).collect()
    }

    /// Literal configuration with every reference replaced by its value in state
    pub fn resolve(&self, state: &ProviderState) -> Result<Attributes> {
        let mut resolved = self.config.clone();
        for (attribute, reference) in &self.references {
            let value = state
                .get(&reference.key())
                .and_then(|r| r.attributes.get(&reference.attribute))
                .filter(|v| v.as_str().is_none_or(|s| !s.is_empty()))
                .ok_or_else(|| {
                    CloudError::UnresolvedReference(format!(
                        "{} of {} ({} is not in state)",
                        attribute,
                        self.key(),
                        reference
                    ))
                })?;
            resolved.insert(attribute.clone(), value.clone());
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resource_set() {
        let mut set = ResourceSet::new();
        assert!(
            set.add(ResourceConfig::new("project", "app", "prisma-postgres"))
                .is_none()
        );
        set.add(ResourceConfig::new("database", "prod", "prisma-postgres"));
        set.add(ResourceConfig::new("database", "dev", "prisma-postgres"));

        assert_eq!(set.len(), 3);
        assert!(set.contains("project", "app"));
        assert!(!set.contains("project", "prod"));
        assert_eq!(set.by_type("database").len(), 2);
        assert!(
            set.add(ResourceConfig::new("project", "app", "prisma-postgres"))
                .is_some()
        );
    }

    #[test]
    fn test_resolve_reference() {
        let config = ResourceConfig::new("database", "prod", "prisma-postgres")
            .with_attribute("name", json!("production"))
            .with_reference("project_id", ResourceRef::new("project", "app", "id"));
        assert_eq!(config.dependencies(), vec!["project:app".to_string()]);

        let mut state = ProviderState::new();
        let err = config.resolve(&state).unwrap_err();
        assert!(matches!(err, CloudError::UnresolvedReference(_)));
        assert!(err.to_string().contains("project.app.id"));

        state.add(
            "project:app".to_string(),
            ResourceState::new("proj_1", "project").with_attribute("id", json!("proj_1")),
        );
        let resolved = config.resolve(&state).unwrap();
        assert_eq!(resolved["project_id"], json!("proj_1"));
        assert_eq!(resolved["name"], json!("production"));
    }

    #[test]
    fn test_default_update_is_rejected() {
        struct Fixed;

        #[async_trait]
        impl Resource for Fixed {
            fn type_name(&self) -> &'static str {
                "fixed"
            }
            fn schema(&self) -> Schema {
                Schema::new("fixed")
            }
            async fn create(&self, config: &Attributes) -> Result<Attributes> {
                Ok(config.clone())
            }
            async fn read(&self, state: &Attributes) -> Result<Option<Attributes>> {
                Ok(Some(state.clone()))
            }
            async fn delete(&self, _state: &Attributes) -> Result<()> {
                Ok(())
            }
            async fn import(&self, _id: &str) -> Result<Attributes> {
                Ok(Attributes::new())
            }
        }

        let err = tokio_test::block_on(Fixed.update(&Attributes::new(), &Attributes::new()))
            .unwrap_err();
        assert!(matches!(err, CloudError::UpdateNotSupported(ref t) if t == "fixed"));
    }
}
