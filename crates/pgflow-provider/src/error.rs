//! Prisma Postgres provider error types

use crate::config::{BASE_URL_ENV, SERVICE_TOKEN_ENV};
use pgflow_api::ApiError;
use pgflow_cloud::CloudError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PrismaError {
    #[error(
        "missing service token: set `service-token` in the provider block or the {env} environment variable",
        env = SERVICE_TOKEN_ENV
    )]
    MissingServiceToken,

    #[error(
        "invalid base URL {0:?}: set a full http(s) URL in `base-url` or {env}",
        env = BASE_URL_ENV
    )]
    InvalidBaseUrl(String),

    #[error("unexpected import identifier {id:?} for {resource_type}: expected {expected}")]
    InvalidImportId {
        resource_type: &'static str,
        id: String,
        expected: &'static str,
    },

    #[error("{resource_type} {id} not found")]
    NotFound {
        resource_type: &'static str,
        id: String,
    },

    #[error("missing attribute `{0}`")]
    MissingAttribute(&'static str),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cloud error: {0}")]
    Cloud(#[from] CloudError),
}

pub type Result<T> = std::result::Result<T, PrismaError>;

impl From<PrismaError> for CloudError {
    fn from(err: PrismaError) -> Self {
        match err {
            PrismaError::MissingServiceToken | PrismaError::InvalidBaseUrl(_) => {
                CloudError::InvalidConfig(err.to_string())
            }
            PrismaError::InvalidImportId {
                resource_type,
                id,
                expected,
            } => CloudError::InvalidImportId {
                resource_type: resource_type.to_string(),
                id,
                expected: expected.to_string(),
            },
            PrismaError::NotFound { .. } => CloudError::ResourceNotFound(err.to_string()),
            PrismaError::MissingAttribute(_) => CloudError::StateError(err.to_string()),
            PrismaError::Api(ref api) if api.is_unauthorized() => {
                CloudError::AuthenticationFailed(err.to_string())
            }
            PrismaError::Api(_) => CloudError::ApiError(err.to_string()),
            PrismaError::Json(e) => CloudError::Json(e),
            PrismaError::Cloud(e) => e,
        }
    }
}
