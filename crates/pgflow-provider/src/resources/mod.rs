//! Resource and data source implementations
//!
//! Each resource keeps a typed model of its attributes and converts it to and
//! from the host's attribute map with serde.

mod connection;
mod database;
mod project;
mod regions;

pub use connection::{ConnectionModel, ConnectionResource};
pub use database::{DatabaseModel, DatabaseResource};
pub use project::{ProjectModel, ProjectResource};
pub use regions::{RegionModel, RegionsDataSource};

use crate::error::{PrismaError, Result};
use pgflow_api::ApiError;
use pgflow_cloud::Attributes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub(crate) fn to_attributes<T: Serialize>(model: &T) -> Result<Attributes> {
    match serde_json::to_value(model)? {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(PrismaError::Json(serde::ser::Error::custom(format!(
            "expected an object, got {}",
            other
        )))),
    }
}

pub(crate) fn from_attributes<T: DeserializeOwned>(attributes: &Attributes) -> Result<T> {
    let map = attributes
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect::<serde_json::Map<String, Value>>();
    Ok(serde_json::from_value(Value::Object(map))?)
}

pub(crate) fn require<'a>(value: &'a str, name: &'static str) -> Result<&'a str> {
    if value.is_empty() {
        return Err(PrismaError::MissingAttribute(name));
    }
    Ok(value)
}

/// Map a 404 to `None`
pub(crate) fn found<T>(result: std::result::Result<T, ApiError>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_not_found() => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Treat a 404 on delete as success
pub(crate) fn deleted(
    result: std::result::Result<(), ApiError>,
    resource_type: &str,
    id: &str,
) -> Result<()> {
    match result {
        Ok(()) => {
            tracing::info!(resource_type, id, "Deleted");
            Ok(())
        }
        Err(e) if e.is_not_found() => {
            tracing::warn!(resource_type, id, "Already deleted");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
