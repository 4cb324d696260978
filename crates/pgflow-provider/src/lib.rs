//! Prisma Postgres provider for pgflow
//!
//! This crate implements the CloudProvider trait for the Prisma Postgres
//! Management API, so pgflow can manage projects, databases and connections
//! declaratively.
//!
//! # Resources
//!
//! | type | import id |
//! |---|---|
//! | `project` | `<project_id>` |
//! | `database` | `<database_id>` |
//! | `connection` | `<database_id>,<connection_id>` |
//!
//! Every configurable attribute forces replacement; the API has no update
//! endpoints. Credentials are only returned when a database or connection is
//! created and are kept in state from then on.
//!
//! # Authentication
//!
//! A service token is taken from the provider block of `pgflow.kdl`, or from
//! `PRISMA_SERVICE_TOKEN`. `PRISMA_API_BASE_URL` overrides the API host.
//!
//! # Example
//!
//! ```ignore
//! use pgflow_cloud::{CloudProvider, ProviderState};
//! use pgflow_provider::{PrismaProvider, ProviderConfig};
//!
//! let provider = PrismaProvider::from_config(ProviderConfig::new())?;
//!
//! let auth = provider.check_auth().await?;
//! if !auth.authenticated {
//!     panic!("Not authenticated: {:?}", auth.error);
//! }
//!
//! let mut state = ProviderState::new();
//! let plan = provider.plan(&desired, &state).await?;
//! let result = provider.apply(&plan, &desired, &mut state).await?;
//! ```

pub mod config;
pub mod error;
pub mod provider;
pub mod resources;

pub use config::{BASE_URL_ENV, ProviderConfig, SERVICE_TOKEN_ENV};
pub use error::{PrismaError, Result};
pub use provider::{PROVIDER_NAME, PrismaProvider};
pub use resources::{
    ConnectionModel, ConnectionResource, DatabaseModel, DatabaseResource, ProjectModel,
    ProjectResource, RegionModel, RegionsDataSource,
};
