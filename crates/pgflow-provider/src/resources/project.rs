use super::{deleted, found, from_attributes, require, to_attributes};
use crate::error::{PrismaError, Result};
use async_trait::async_trait;
use pgflow_api::{PrismaClient, Project};
use pgflow_cloud::{Attribute, Attributes, Resource, Schema};
use serde::{Deserialize, Serialize};

pub const TYPE_NAME: &str = "project";

/// Attributes of a project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectModel {
    pub id: String,
    pub name: String,
    pub created_at: String,
}

impl ProjectModel {
    fn refresh_from(&mut self, project: &Project) {
        self.id = project.id.clone();
        self.name = project.name.clone();
        self.created_at = project.created_at.clone();
    }
}

/// `project`: a Prisma Postgres project
pub struct ProjectResource {
    client: PrismaClient,
}

impl ProjectResource {
    pub fn new(client: PrismaClient) -> Self {
        Self { client }
    }

    async fn create_project(&self, config: &Attributes) -> Result<ProjectModel> {
        let mut model: ProjectModel = from_attributes(config)?;
        let name = require(&model.name, "name")?;

        tracing::debug!(name, "Creating Prisma project");
        let project = self.client.create_project(name, false).await?;
        model.refresh_from(&project);

        tracing::info!(id = %model.id, name = %model.name, "Created Prisma project");
        Ok(model)
    }

    async fn read_project(&self, state: &Attributes) -> Result<Option<ProjectModel>> {
        let mut model: ProjectModel = from_attributes(state)?;
        let id = require(&model.id, "id")?;

        tracing::debug!(id, "Reading Prisma project");
        let Some(project) = found(self.client.get_project(id).await)? else {
            tracing::warn!(id, "Project not found, removing from state");
            return Ok(None);
        };

        model.refresh_from(&project);
        Ok(Some(model))
    }

    async fn delete_project(&self, state: &Attributes) -> Result<()> {
        let model: ProjectModel = from_attributes(state)?;
        let id = require(&model.id, "id")?;
        deleted(self.client.delete_project(id).await, TYPE_NAME, id)
    }

    async fn import_project(&self, id: &str) -> Result<ProjectModel> {
        let project = found(self.client.get_project(id).await)?.ok_or_else(|| {
            PrismaError::NotFound {
                resource_type: TYPE_NAME,
                id: id.to_string(),
            }
        })?;

        let mut model = ProjectModel::default();
        model.refresh_from(&project);
        Ok(model)
    }
}

#[async_trait]
impl Resource for ProjectResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("Manages a Prisma Postgres project.")
            .with_attribute(
                "id",
                Attribute::computed_string().with_description("The unique identifier of the project."),
            )
            .with_attribute(
                "name",
                Attribute::required_string()
                    .requires_replace()
                    .with_description("The name of the project."),
            )
            .with_attribute(
                "created_at",
                Attribute::computed_string()
                    .with_description("The timestamp when the project was created."),
            )
    }

    async fn create(&self, config: &Attributes) -> pgflow_cloud::Result<Attributes> {
        let model = self.create_project(config).await?;
        Ok(to_attributes(&model)?)
    }

    async fn read(&self, state: &Attributes) -> pgflow_cloud::Result<Option<Attributes>> {
        match self.read_project(state).await? {
            Some(model) => Ok(Some(to_attributes(&model)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, state: &Attributes) -> pgflow_cloud::Result<()> {
        Ok(self.delete_project(state).await?)
    }

    async fn import(&self, id: &str) -> pgflow_cloud::Result<Attributes> {
        let model = self.import_project(id).await?;
        Ok(to_attributes(&model)?)
    }
}
