//! Prisma Postgres Management API client
//!
//! A thin, typed binding over the REST API at `https://api.prisma.io`.
//! Every operation is a single request: no retries, no polling.
//!
//! # Example
//!
//! ```ignore
//! use pgflow_api::{ClientConfig, PrismaClient};
//!
//! let client = PrismaClient::new(ClientConfig::new("service-token"))?;
//!
//! let project = client.create_project("my-project", false).await?;
//! let database = client
//!     .create_database(&project.id, "production", Some("us-east-1"))
//!     .await?;
//!
//! // Credentials are only returned here. Persist them now.
//! if let Some(direct) = &database.direct_connection {
//!     println!("{}", direct.url().unwrap_or_default());
//! }
//! ```
//!
//! # Cancellation
//!
//! Dropping a returned future aborts the request in flight, so callers can
//! bound any call with `tokio::time::timeout` or race it in `tokio::select!`.

pub mod client;
pub mod error;
pub mod model;

pub use client::{BASE_URL, ClientConfig, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, PrismaClient};
pub use error::{ApiError, Result};
pub use model::{
    ApiKey, Connection, CreateConnectionRequest, CreateDatabaseRequest, CreateProjectRequest,
    Database, DatabaseRef, DatabaseStatus, DirectConnection, Envelope, Page, Pagination, Project,
    ProjectRef, Region, RegionStatus, WorkspaceRef,
};
