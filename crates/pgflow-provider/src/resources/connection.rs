use super::{deleted, found, from_attributes, require, to_attributes};
use crate::error::{PrismaError, Result};
use async_trait::async_trait;
use pgflow_api::{Connection, PrismaClient};
use pgflow_cloud::{Attribute, Attributes, Resource, Schema};
use serde::{Deserialize, Serialize};

pub const TYPE_NAME: &str = "connection";

const IMPORT_FORMAT: &str = "database_id,connection_id";

/// Attributes of a connection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionModel {
    pub id: String,
    pub database_id: String,
    pub name: String,
    pub created_at: String,
    pub connection_string: String,
    pub host: String,
    pub user: String,
    pub password: String,
}

impl ConnectionModel {
    fn refresh_from(&mut self, connection: &Connection) {
        self.id = connection.id.clone();
        self.name = connection.name.clone();
        self.created_at = connection.created_at.clone();
    }
}

/// Split a `database_id,connection_id` import identifier
pub fn parse_import_id(id: &str) -> Result<(&str, &str)> {
    let invalid = || PrismaError::InvalidImportId {
        resource_type: TYPE_NAME,
        id: id.to_string(),
        expected: IMPORT_FORMAT,
    };

    let mut parts = id.split(',');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(database_id), Some(connection_id), None)
            if !database_id.is_empty() && !connection_id.is_empty() =>
        {
            Ok((database_id, connection_id))
        }
        _ => Err(invalid()),
    }
}

/// `connection`: an API key for a database
///
/// The API has no endpoint for a single connection, so reads list the
/// connections of the parent database and look for the id.
pub struct ConnectionResource {
    client: PrismaClient,
}

impl ConnectionResource {
    pub fn new(client: PrismaClient) -> Self {
        Self { client }
    }

    async fn find(&self, database_id: &str, id: &str) -> Result<Option<Connection>> {
        let Some(connections) = found(self.client.list_connections(database_id).await)? else {
            tracing::warn!(database_id, id, "Database not found, connection is gone too");
            return Ok(None);
        };
        Ok(connections.into_iter().find(|c| c.id == id))
    }

    async fn create_connection(&self, config: &Attributes) -> Result<ConnectionModel> {
        let mut model: ConnectionModel = from_attributes(config)?;
        let database_id = require(&model.database_id, "database_id")?;
        let name = require(&model.name, "name")?;

        tracing::debug!(database_id, name, "Creating Prisma connection");
        let connection = self.client.create_connection(database_id, name).await?;

        model.refresh_from(&connection);
        model.connection_string = connection.connection_string.unwrap_or_default();
        model.host = connection.host.unwrap_or_default();
        model.user = connection.user.unwrap_or_default();
        model.password = connection.pass.unwrap_or_default();

        tracing::info!(id = %model.id, name = %model.name, "Created Prisma connection");
        Ok(model)
    }

    async fn read_connection(&self, state: &Attributes) -> Result<Option<ConnectionModel>> {
        let mut model: ConnectionModel = from_attributes(state)?;
        let id = require(&model.id, "id")?;
        let database_id = require(&model.database_id, "database_id")?;

        tracing::debug!(id, database_id, "Reading Prisma connection");
        let Some(connection) = self.find(database_id, id).await? else {
            tracing::warn!(id, "Connection not found, removing from state");
            return Ok(None);
        };

        model.refresh_from(&connection);
        Ok(Some(model))
    }

    async fn delete_connection(&self, state: &Attributes) -> Result<()> {
        let model: ConnectionModel = from_attributes(state)?;
        let id = require(&model.id, "id")?;
        deleted(self.client.delete_connection(id).await, TYPE_NAME, id)
    }

    async fn import_connection(&self, import_id: &str) -> Result<ConnectionModel> {
        let (database_id, id) = parse_import_id(import_id)?;

        let connection = self
            .find(database_id, id)
            .await?
            .ok_or_else(|| PrismaError::NotFound {
                resource_type: TYPE_NAME,
                id: import_id.to_string(),
            })?;

        let mut model = ConnectionModel {
            database_id: database_id.to_string(),
            ..Default::default()
        };
        model.refresh_from(&connection);
        Ok(model)
    }
}

#[async_trait]
impl Resource for ConnectionResource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("Manages a connection (API key) for a Prisma Postgres database.")
            .with_attribute("id", Attribute::computed_string())
            .with_attribute(
                "database_id",
                Attribute::required_string()
                    .requires_replace()
                    .with_description("The ID of the database this connection belongs to."),
            )
            .with_attribute(
                "name",
                Attribute::required_string()
                    .requires_replace()
                    .with_description("The name of the connection."),
            )
            .with_attribute("created_at", Attribute::computed_string())
            .with_attribute(
                "connection_string",
                Attribute::computed_string()
                    .sensitive()
                    .with_description("The Prisma Accelerate connection string."),
            )
            .with_attribute("host", Attribute::computed_string())
            .with_attribute("user", Attribute::computed_string())
            .with_attribute("password", Attribute::computed_string().sensitive())
    }

    async fn create(&self, config: &Attributes) -> pgflow_cloud::Result<Attributes> {
        let model = self.create_connection(config).await?;
        Ok(to_attributes(&model)?)
    }

    async fn read(&self, state: &Attributes) -> pgflow_cloud::Result<Option<Attributes>> {
        match self.read_connection(state).await? {
            Some(model) => Ok(Some(to_attributes(&model)?)),
            None => Ok(None),
        }
    }

    async fn delete(&self, state: &Attributes) -> pgflow_cloud::Result<()> {
        Ok(self.delete_connection(state).await?)
    }

    async fn import(&self, id: &str) -> pgflow_cloud::Result<Attributes> {
        let model = self.import_connection(id).await?;
        Ok(to_attributes(&model)?)
    }
}
