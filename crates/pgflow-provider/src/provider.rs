//! Prisma Postgres provider implementation

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::resources::{
    ConnectionResource, DatabaseResource, ProjectResource, RegionModel, RegionsDataSource,
};
use async_trait::async_trait;
use pgflow_api::PrismaClient;
use pgflow_cloud::{
    Action, ActionType, ApplyResult, Attributes, AuthStatus, CloudError, CloudProvider, DataSource,
    Plan, ProviderState, Resource, ResourceConfig, ResourceSet, ResourceState, ResourceStatus,
    Schema, resource_key,
};
use serde_json::Value;
use std::cmp::Reverse;
use std::collections::HashSet;

pub const PROVIDER_NAME: &str = "prisma-postgres";

/// Attributes through which a resource points at its parent
const PARENT_ATTRIBUTES: [&str; 2] = ["project_id", "database_id"];

/// Prisma Postgres provider
///
/// Resources are held in dependency order: project, database, connection.
pub struct PrismaProvider {
    client: PrismaClient,
    resources: Vec<Box<dyn Resource>>,
    regions: RegionsDataSource,
}

impl PrismaProvider {
    pub fn new(client: PrismaClient) -> Self {
        let resources: Vec<Box<dyn Resource>> = vec![
            Box::new(ProjectResource::new(client.clone())),
            Box::new(DatabaseResource::new(client.clone())),
            Box::new(ConnectionResource::new(client.clone())),
        ];
        Self {
            regions: RegionsDataSource::new(client.clone()),
            client,
            resources,
        }
    }

    pub fn from_config(config: ProviderConfig) -> Result<Self> {
        Ok(Self::new(config.client()?))
    }

    pub fn client(&self) -> &PrismaClient {
        &self.client
    }

    /// Resource type names in dependency order
    pub fn resource_types(&self) -> Vec<&'static str> {
        self.resources.iter().map(|r| r.type_name()).collect()
    }

    pub fn resource(&self, resource_type: &str) -> pgflow_cloud::Result<&dyn Resource> {
        self.resources
            .iter()
            .find(|r| r.type_name() == resource_type)
            .map(|r| r.as_ref())
            .ok_or_else(|| CloudError::UnknownResourceType(resource_type.to_string()))
    }

    pub fn schema(&self, resource_type: &str) -> pgflow_cloud::Result<Schema> {
        Ok(self.resource(resource_type)?.schema())
    }

    /// Position in dependency order; unknown types sort last
    fn rank(&self, resource_type: &str) -> usize {
        self.resources
            .iter()
            .position(|r| r.type_name() == resource_type)
            .unwrap_or(self.resources.len())
    }

    /// The regions data source
    pub async fn regions(&self) -> pgflow_cloud::Result<Vec<RegionModel>> {
        Ok(self.regions.list().await?)
    }

    pub fn regions_data_source(&self) -> &dyn DataSource {
        &self.regions
    }

    /// Check every desired resource against its schema and references
    pub fn validate(&self, desired: &ResourceSet) -> pgflow_cloud::Result<()> {
        let mut problems = Vec::new();

        for config in desired.iter() {
            let label = format!("{}.{}", config.resource_type, config.name);
            let resource = match self.resource(&config.resource_type) {
                Ok(resource) => resource,
                Err(e) => {
                    problems.push(format!("{}: {}", label, e));
                    continue;
                }
            };

            let mut attributes = config.config.clone();
            for (attribute, reference) in &config.references {
                if attributes.contains_key(attribute) {
                    problems.push(format!(
                        "{}: `{}` is set both directly and by reference",
                        label, attribute
                    ));
                }
                if !desired.contains(&reference.resource_type, &reference.name) {
                    problems.push(format!("{}: references undeclared {}", label, reference));
                }
                attributes.insert(attribute.clone(), Value::String(reference.to_string()));
            }

            for diagnostic in resource.schema().validate(&attributes) {
                problems.push(format!("{}: {}", label, diagnostic));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(CloudError::InvalidConfig(problems.join("; ")))
        }
    }

    /// Create a resource from its desired configuration and record it
    async fn create_resource(
        &self,
        config: &ResourceConfig,
        state: &mut ProviderState,
    ) -> pgflow_cloud::Result<()> {
        let resource = self.resource(&config.resource_type)?;
        let mut attributes = config.resolve(state)?;
        resource.schema().apply_defaults(&mut attributes);

        let created = resource.create(&attributes).await?;
        state.add(config.key(), to_resource_state(resource.type_name(), created));
        Ok(())
    }

    async fn apply_action(
        &self,
        action: &Action,
        desired: &ResourceSet,
        state: &mut ProviderState,
    ) -> pgflow_cloud::Result<String> {
        let resource = self.resource(&action.resource_type)?;

        match action.action_type {
            ActionType::NoOp => Ok("unchanged".to_string()),
            ActionType::Delete => {
                if let Some(current) = state.get(&action.id).cloned() {
                    resource.delete(&current.attributes).await?;
                    state.remove(&action.id);
                    self.forget_dependents(&current.id, state);
                }
                Ok(format!("deleted {}", action.id))
            }
            ActionType::Create | ActionType::Replace | ActionType::Update => {
                let config = desired
                    .resources
                    .get(&action.id)
                    .ok_or_else(|| CloudError::ResourceNotFound(action.id.clone()))?;

                match action.action_type {
                    ActionType::Update => {
                        let current = state
                            .get(&action.id)
                            .cloned()
                            .ok_or_else(|| CloudError::ResourceNotFound(action.id.clone()))?;
                        let mut attributes = config.resolve(state)?;
                        resource.schema().apply_defaults(&mut attributes);
                        let updated = resource.update(&attributes, &current.attributes).await?;
                        state.add(action.id.clone(), to_resource_state(resource.type_name(), updated));
                        Ok(format!("updated {}", action.id))
                    }
                    ActionType::Replace => {
                        if let Some(current) = state.get(&action.id).cloned() {
                            resource.delete(&current.attributes).await?;
                            state.remove(&action.id);
                        }
                        self.create_resource(config, state).await?;
                        Ok(format!("replaced {}", action.id))
                    }
                    _ => {
                        self.create_resource(config, state).await?;
                        Ok(format!("created {}", action.id))
                    }
                }
            }
        }
    }

    /// Drop state entries whose parent (transitively) had the remote id `id`
    ///
    /// The API deletes children together with their parent.
    fn forget_dependents(&self, id: &str, state: &mut ProviderState) {
        let mut gone = vec![id.to_string()];
        while let Some(parent_id) = gone.pop() {
            let children: Vec<String> = state
                .iter()
                .filter(|(_, r)| {
                    PARENT_ATTRIBUTES
                        .iter()
                        .any(|attr| r.attributes.get(*attr).and_then(Value::as_str) == Some(parent_id.as_str()))
                })
                .map(|(k, _)| k.clone())
                .collect();

            for key in children {
                if let Some(child) = state.remove(&key) {
                    tracing::warn!(key = %key, "Removed from state together with its parent");
                    gone.push(child.id);
                }
            }
        }
    }
}

/// Build the state entry for a resource's attributes
fn to_resource_state(resource_type: &str, attributes: Attributes) -> ResourceState {
    let id = attributes
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let status = match attributes.get("status").and_then(Value::as_str) {
        None => ResourceStatus::Active,
        Some("provisioning") => ResourceStatus::Provisioning,
        Some("ready") => ResourceStatus::Ready,
        Some("failure") => ResourceStatus::Failure,
        Some("recovering") => ResourceStatus::Recovering,
        Some(_) => ResourceStatus::Unknown,
    };
    ResourceState::new(id, resource_type)
        .with_status(status)
        .with_attributes(attributes)
}

#[async_trait]
impl CloudProvider for PrismaProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn display_name(&self) -> &str {
        "Prisma Postgres"
    }

    async fn check_auth(&self) -> pgflow_cloud::Result<AuthStatus> {
        match self.client.list_regions().await {
            Ok(regions) => Ok(AuthStatus::ok(format!(
                "{} ({} regions available)",
                self.client.base_url(),
                regions.len()
            ))),
            Err(e) if e.is_unauthorized() => Ok(AuthStatus::failed(e.to_string())),
            Err(e) => Err(CloudError::ApiError(e.to_string())),
        }
    }

    async fn refresh(&self, state: &mut ProviderState) -> pgflow_cloud::Result<Vec<String>> {
        let mut removed = Vec::new();

        for key in state.keys() {
            let Some(current) = state.get(&key).cloned() else {
                continue;
            };
            let resource = self.resource(&current.resource_type)?;

            match resource.read(&current.attributes).await? {
                Some(attributes) => {
                    let mut refreshed = to_resource_state(resource.type_name(), attributes);
                    refreshed.created_at = current.created_at;
                    state.add(key, refreshed);
                }
                None => {
                    tracing::warn!(key = %key, "Resource no longer exists, removing from state");
                    state.remove(&key);
                    removed.push(key);
                }
            }
        }

        Ok(removed)
    }

    async fn plan(
        &self,
        desired: &ResourceSet,
        state: &ProviderState,
    ) -> pgflow_cloud::Result<Plan> {
        self.validate(desired)?;

        let mut actions = Vec::new();

        // Deletes first, children before parents
        let mut stale: Vec<(&String, &ResourceState)> = state
            .iter()
            .filter(|(key, _)| !desired.resources.contains_key(*key))
            .collect();
        stale.sort_by_key(|(key, r)| (Reverse(self.rank(&r.resource_type)), (*key).clone()));

        for (key, current) in stale {
            let name = key.split_once(':').map(|(_, n)| n).unwrap_or(key.as_str());
            actions.push(
                Action::new(
                    ActionType::Delete,
                    current.resource_type.clone(),
                    name,
                    format!("delete {} {} ({})", current.resource_type, name, current.id),
                )
                .with_detail("id", Value::String(current.id.clone())),
            );
        }

        // Then everything declared, parents before children
        let mut ordered: Vec<&ResourceConfig> = desired.iter().collect();
        ordered.sort_by_key(|r| (self.rank(&r.resource_type), r.key()));

        // Keys whose remote id will change during apply
        let mut recreated: HashSet<String> = HashSet::new();

        for config in ordered {
            let key = config.key();
            let resource = self.resource(&config.resource_type)?;
            let schema = resource.schema();

            let Some(current) = state.get(&key) else {
                recreated.insert(key);
                actions.push(Action::new(
                    ActionType::Create,
                    config.resource_type.clone(),
                    config.name.clone(),
                    format!("create {} {}", config.resource_type, config.name),
                ));
                continue;
            };

            let pending: Vec<String> = config
                .dependencies()
                .into_iter()
                .filter(|dep| recreated.contains(dep))
                .collect();

            let mut attributes = if pending.is_empty() {
                config.resolve(state)?
            } else {
                config.config.clone()
            };
            schema.apply_defaults(&mut attributes);
            let changes = schema.diff(&attributes, &current.attributes);

            let action = if !pending.is_empty() {
                recreated.insert(key);
                Action::new(
                    ActionType::Replace,
                    config.resource_type.clone(),
                    config.name.clone(),
                    format!(
                        "replace {} {} ({} will be re-created)",
                        config.resource_type,
                        config.name,
                        pending.join(", ")
                    ),
                )
                .with_changes(changes.changes)
            } else if changes.requires_replace() {
                recreated.insert(key);
                Action::new(
                    ActionType::Replace,
                    config.resource_type.clone(),
                    config.name.clone(),
                    format!(
                        "replace {} {} ({} changed)",
                        config.resource_type,
                        config.name,
                        changes.names().join(", ")
                    ),
                )
                .with_changes(changes.changes)
            } else if !changes.is_empty() {
                Action::new(
                    ActionType::Update,
                    config.resource_type.clone(),
                    config.name.clone(),
                    format!(
                        "update {} {} ({} changed)",
                        config.resource_type,
                        config.name,
                        changes.names().join(", ")
                    ),
                )
                .with_changes(changes.changes)
            } else {
                Action::new(
                    ActionType::NoOp,
                    config.resource_type.clone(),
                    config.name.clone(),
                    format!("{} {} is up to date", config.resource_type, config.name),
                )
            };

            actions.push(action.with_detail("id", Value::String(current.id.clone())));
        }

        Ok(Plan::new(actions))
    }

    async fn apply(
        &self,
        plan: &Plan,
        desired: &ResourceSet,
        state: &mut ProviderState,
    ) -> pgflow_cloud::Result<ApplyResult> {
        let mut result = ApplyResult::new();
        let start = std::time::Instant::now();

        for action in &plan.actions {
            if action.action_type == ActionType::NoOp {
                continue;
            }

            if let Some(config) = desired.resources.get(&action.id) {
                if let Some(dep) = config.dependencies().into_iter().find(|d| result.has_failed(d)) {
                    tracing::warn!(action = %action.id, dependency = %dep, "Skipped");
                    result.add_failure(action.id.clone(), format!("dependency {} failed", dep));
                    continue;
                }
            }

            tracing::info!("{}", action.description);
            match self.apply_action(action, desired, state).await {
                Ok(message) => result.add_success(action.id.clone(), message),
                Err(e) => {
                    tracing::error!(action = %action.id, error = %e, "Action failed");
                    result.add_failure(action.id.clone(), e.to_string());
                }
            }
        }

        result.duration_ms = start.elapsed().as_millis() as u64;
        Ok(result)
    }

    async fn import(
        &self,
        resource_type: &str,
        name: &str,
        id: &str,
        state: &mut ProviderState,
    ) -> pgflow_cloud::Result<ResourceState> {
        let resource = self.resource(resource_type)?;
        let key = resource_key(resource_type, name);
        if state.contains(&key) {
            return Err(CloudError::ResourceAlreadyExists(key));
        }

        tracing::info!(key = %key, id, "Importing");
        let attributes = resource.import(id).await?;
        let imported = to_resource_state(resource.type_name(), attributes);
        state.add(key, imported.clone());
        Ok(imported)
    }

    async fn destroy(&self, key: &str, state: &mut ProviderState) -> pgflow_cloud::Result<()> {
        let current = state
            .get(key)
            .cloned()
            .ok_or_else(|| CloudError::ResourceNotFound(key.to_string()))?;
        let resource = self.resource(&current.resource_type)?;

        resource.delete(&current.attributes).await?;
        state.remove(key);
        self.forget_dependents(&current.id, state);
        Ok(())
    }

    async fn destroy_all(&self, state: &mut ProviderState) -> pgflow_cloud::Result<ApplyResult> {
        let nothing = ResourceSet::new();
        let plan = self.plan(&nothing, state).await?;
        self.apply(&plan, &nothing, state).await
    }
}
