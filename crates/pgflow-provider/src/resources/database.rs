use super::{deleted, found, from_attributes, require, to_attributes};
use crate::error::{PrismaError, Result};
use async_trait::async_trait;
use pgflow_api::{Database, PrismaClient};
use pgflow_cloud::{Attribute, Attributes, Resource, Schema};
use serde::{Deserialize, Serialize};

pub const TYPE_NAME: &str = "database";

pub const DEFAULT_REGION: &str = "us-east-1";

/// Attributes of a database
///
/// The credential fields are only known from the creation response and are
/// carried over unchanged on every later read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseModel {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub region: String,
    pub status: String,
    pub created_at: String,
    pub connection_string: String,
    pub direct_url: String,
    pub direct_host: String,
    pub direct_user: String,
    pub direct_password: String,
}

impl DatabaseModel {
    /// Fields every response carries
    fn refresh_from(&mut self, database: &Database) {
        self.id = database.id.clone();
        self.name = database.name.clone();
        self.status = database.status.to_string();
        self.created_at = database.created_at.clone();
        if let Some(project) = &database.project {
            self.project_id = project.id.clone();
        }
        if let Some(region) = &database.region {
            self.region = region.id.clone();
        }
    }

    /// One-time credentials of a creation response
    fn credentials_from(&mut self, database: &Database) {
        self.connection_string = database.connection_string.clone().unwrap_or_default();
        match &database.direct_connection {
            Some(direct) => {
                self.direct_host = direct.host.clone();
                self.direct_user = direct.user.clone();
                self.direct_password = direct.pass.clone();
                self.direct_url = direct.url().unwrap_or_default();
            }
            None => {
                self.direct_host = String::new();
                self.direct_user = String::new();
                self.direct_password = String::new();
                self.direct_url = String::new();
            }
        }
    }
}

/// `database`: a Prisma Postgres database within a project
pub struct DatabaseResource {
    client: PrismaClient,
}

impl DatabaseResource {
    pub fn new(client: PrismaClient) -> Self {
        Self { client }
    }

    async fn create_database(&self, config: &Attributes) -> Result<DatabaseModel> {
        let mut model: DatabaseModel = from_attributes(config)?;
        let project_id = require(&model.project_id, "project_id")?;
        let name = require(&model.name, "name")?;

        tracing::debug!(project_id, name, region = %model.region, "Creating Prisma database");
        let database = self
            .client
            .create_database(project_id, name, Some(model.region.as_str()))
            .await?;

        model.refresh_from(&database);
        model.credentials_from(&database);

        tracing::info!(id = %model.id, name = %model.name, status = %model.status, "Created Prisma database");
        Ok(model)
    }

    async fn read_database(&self, state: &Attributes) -> Result<Option<DatabaseModel>> {
        let mut model: DatabaseModel = from_attributes(state)?;
        let id = require(&model.id, "id")?;

        tracing::debug!(id, "Reading Prisma database");
        let Some(database) = found(self.client.get_database(id).await)? else {
            tracing::warn!(id, "Database not found, removing from state");
            return Ok(None);
        };

        model.refresh_from(&database);
        Ok(Some(model))
    }

    async fn delete_database(&self, state: &Attributes) -> Result<()> {
        let model: DatabaseModel = from_attributes(state)?;
        let id = require(&model.id, "id")?;
        deleted(self.client.delete_database(id).await, TYPE_NAME, id)
    }

    async fn import_database(&self, id: &str) -> Result<DatabaseModel> {
        let database = found(self.client.get_database(id).await)?.ok_or_else(|| {
            PrismaError::NotFound {
                resource_type: TYPE_NAME,
                id: id.to_string(),
            }
        })?;

        let mut model = DatabaseModel::default();
        model.refresh_from(&database);
        Ok(model)
    }
}

#[async_trait]
impl Resource for DatabaseResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("Manages a Prisma Postgres database within a project.")
            .with_attribute(
                "id",
                Attribute::computed_string()
                    .with_description("The unique identifier of the database."),
            )
            .with_attribute(
                "project_id",
                Attribute::required_string()
                    .requires_replace()
                    .with_description("The ID of the project this database belongs to."),
            )
            .with_attribute(
                "name",
                Attribute::required_string()
                    .requires_replace()
                    .with_description("The name of the database."),
            )
            .with_attribute(
                "region",
                Attribute::optional_string()
                    .computed()
                    .with_default(DEFAULT_REGION)
                    .requires_replace()
                    .with_description("The region where the database is deployed."),
            )
            .with_attribute(
                "status",
                Attribute::computed_string().with_description("The current status of the database."),
            )
            .with_attribute(
                "created_at",
                Attribute::computed_string()
                    .with_description("The timestamp when the database was created."),
            )
            .with_attribute(
                "connection_string",
                Attribute::computed_string()
                    .sensitive()
                    .with_description("The Prisma Accelerate connection string."),
            )
            .with_attribute(
                "direct_url",
                Attribute::computed_string()
                    .sensitive()
                    .with_description("The direct PostgreSQL connection URL."),
            )
            .with_attribute(
                "direct_host",
                Attribute::computed_string().with_description("The direct PostgreSQL host."),
            )
            .with_attribute(
                "direct_user",
                Attribute::computed_string().with_description("The direct PostgreSQL user."),
            )
            .with_attribute(
                "direct_password",
                Attribute::computed_string()
                    .sensitive()
                    .with_description("The direct PostgreSQL password."),
            )
    }

    async fn create(&self, config: &Attributes) -> pgflow_cloud::Result<Attributes> {
        let model = self.create_database(config).await?;
        Ok(to_attributes(&model)?)
    }

    async fn read(&self, state: &Attributes) -> pgflow_cloud::Result<Option<Attributes>> {
        match self.read_database(state).await? {
            Some(model) => Ok(Some(to_attributes(&model)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, state: &Attributes) -> pgflow_cloud::Result<()> {
        Ok(self.delete_database(state).await?)
    }

    async fn import(&self, id: &str) -> pgflow_cloud::Result<Attributes> {
        let model = self.import_database(id).await?;
        Ok(to_attributes(&model)?)
    }
}
