//! HTTP client for the Prisma Postgres Management API

use crate::error::{ApiError, Result};
use crate::model::{
    Connection, CreateConnectionRequest, CreateDatabaseRequest, CreateProjectRequest, Database,
    Envelope, Page, Project, Region,
};
use reqwest::Method;
use reqwest::header::{ACCEPT, CONTENT_TYPE, USER_AGENT};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Production API host
pub const BASE_URL: &str = "https://api.prisma.io";

/// Timeout of the HTTP client built when none is supplied
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_USER_AGENT: &str = concat!("pgflow/", env!("CARGO_PKG_VERSION"));

const JSON: &str = "application/json";

/// Configuration for [`PrismaClient::new`]
///
/// Empty strings count as unset, matching how the values arrive from
/// environment variables.
#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    pub service_token: String,
    pub user_agent: Option<String>,
    pub base_url: Option<String>,
    pub http_client: Option<reqwest::Client>,
}

impl ClientConfig {
    pub fn new(service_token: impl Into<String>) -> Self {
        Self {
            service_token: service_token.into(),
            ..Default::default()
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_http_client(mut self, http_client: reqwest::Client) -> Self {
        self.http_client = Some(http_client);
        self
    }
}

/// Prisma Postgres API client
///
/// Cheap to clone; clones share the underlying connection pool. The client
/// holds no mutable state, so one instance can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct PrismaClient {
    http: reqwest::Client,
    service_token: String,
    user_agent: String,
    base_url: String,
}

impl PrismaClient {
    /// Create a new client
    ///
    /// Fails only when the default HTTP client cannot be built (TLS backend
    /// initialisation).
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = match config.http_client {
            Some(http) => http,
            None => reqwest::Client::builder()
                .timeout(DEFAULT_TIMEOUT)
                .build()
                .map_err(ApiError::Build)?,
        };

        let base_url = config
            .base_url
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let user_agent = config
            .user_agent
            .filter(|ua| !ua.is_empty())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        Ok(Self {
            http,
            service_token: config.service_token,
            user_agent,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Send one request and return the raw body of a successful response
    async fn send<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<Vec<u8>>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);

        let mut builder = self
            .http
            .request(method.clone(), &url)
            .bearer_auth(&self.service_token)
            .header(CONTENT_TYPE, JSON)
            .header(ACCEPT, JSON)
            .header(USER_AGENT, self.user_agent.as_str());

        if let Some(body) = body {
            let payload = serde_json::to_vec(body).map_err(ApiError::Encode)?;
            builder = builder.body(payload);
        }

        let request = builder.build().map_err(ApiError::Build)?;

        tracing::debug!(%method, path, "Sending Prisma API request");

        let response = self
            .http
            .execute(request)
            .await
            .map_err(ApiError::Transport)?;

        let status = response.status();
        let bytes = response.bytes().await.map_err(ApiError::ReadBody)?;

        tracing::debug!(%method, path, status = status.as_u16(), "Received Prisma API response");

        if status.as_u16() >= 400 {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: status.canonical_reason().unwrap_or_default().to_string(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        Ok(bytes.to_vec())
    }

    /// Send a request and decode the response body
    ///
    /// An empty success body decodes to `T::default()`.
    async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        let bytes = self.send(method, path, body).await?;
        if bytes.is_empty() {
            return Ok(T::default());
        }
        serde_json::from_slice(&bytes).map_err(ApiError::Decode)
    }

    async fn get<T>(&self, path: &str) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        self.request::<(), T>(Method::GET, path, None).await
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned + Default,
    {
        self.request(Method::POST, path, Some(body)).await
    }

    async fn delete(&self, path: &str) -> Result<()> {
        self.send::<()>(Method::DELETE, path, None).await?;
        Ok(())
    }

    // ========== Projects ==========

    /// Create a new project
    ///
    /// With `create_database` the API also provisions a default database and
    /// returns it in [`Project::database`].
    pub async fn create_project(&self, name: &str, create_database: bool) -> Result<Project> {
        let req = CreateProjectRequest {
            name: name.to_string(),
            create_database,
        };
        let resp: Envelope<Project> = self.post("/v1/projects", &req).await?;
        Ok(resp.data)
    }

    pub async fn get_project(&self, id: &str) -> Result<Project> {
        let resp: Envelope<Project> = self.get(&format!("/v1/projects/{}", id)).await?;
        Ok(resp.data)
    }

    pub async fn delete_project(&self, id: &str) -> Result<()> {
        self.delete(&format!("/v1/projects/{}", id)).await
    }

    // ========== Databases ==========

    /// Create a database in a project
    ///
    /// `None` or an empty region lets the API choose (`us-east-1`). The
    /// returned value carries the one-time credentials.
    pub async fn create_database(
        &self,
        project_id: &str,
        name: &str,
        region: Option<&str>,
    ) -> Result<Database> {
        let req = CreateDatabaseRequest {
            name: name.to_string(),
            region: region.filter(|r| !r.is_empty()).map(str::to_string),
            is_default: false,
        };
        let resp: Envelope<Database> = self
            .post(&format!("/v1/projects/{}/databases", project_id), &req)
            .await?;
        Ok(resp.data)
    }

    pub async fn get_database(&self, id: &str) -> Result<Database> {
        let resp: Envelope<Database> = self.get(&format!("/v1/databases/{}", id)).await?;
        Ok(resp.data)
    }

    pub async fn delete_database(&self, id: &str) -> Result<()> {
        self.delete(&format!("/v1/databases/{}", id)).await
    }

    // ========== Connections ==========

    /// Create a connection (API key) for a database
    pub async fn create_connection(&self, database_id: &str, name: &str) -> Result<Connection> {
        let req = CreateConnectionRequest {
            name: name.to_string(),
        };
        let resp: Envelope<Connection> = self
            .post(&format!("/v1/databases/{}/connections", database_id), &req)
            .await?;
        Ok(resp.data)
    }

    /// List the connections of a database
    ///
    /// Only the first page is fetched.
    pub async fn list_connections(&self, database_id: &str) -> Result<Vec<Connection>> {
        let resp: Page<Connection> = self
            .get(&format!("/v1/databases/{}/connections", database_id))
            .await?;
        Ok(resp.data)
    }

    pub async fn delete_connection(&self, id: &str) -> Result<()> {
        self.delete(&format!("/v1/connections/{}", id)).await
    }

    // ========== Regions ==========

    /// List Postgres regions in the order the API returns them
    pub async fn list_regions(&self) -> Result<Vec<Region>> {
        let resp: Page<Region> = self.get("/v1/regions/postgres").await?;
        Ok(resp.data)
    }
}
