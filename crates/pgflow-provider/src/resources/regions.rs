use super::to_attributes;
use crate::error::Result;
use async_trait::async_trait;
use pgflow_api::{PrismaClient, Region};
use pgflow_cloud::{Attribute, Attributes, DataSource, Schema};
use serde::{Deserialize, Serialize};

pub const TYPE_NAME: &str = "regions";

/// One available region
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionModel {
    pub id: String,
    pub name: String,
    /// Empty when the API does not report one
    pub status: String,
}

impl From<Region> for RegionModel {
    fn from(region: Region) -> Self {
        Self {
            id: region.id,
            name: region.name,
            status: region.status.map(|s| s.to_string()).unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct RegionsModel {
    regions: Vec<RegionModel>,
}

/// `regions`: the Postgres regions, in API order
pub struct RegionsDataSource {
    client: PrismaClient,
}

impl RegionsDataSource {
    pub fn new(client: PrismaClient) -> Self {
        Self { client }
    }

    pub async fn list(&self) -> Result<Vec<RegionModel>> {
        tracing::debug!("Reading Prisma regions");
        let regions = self.client.list_regions().await?;
        Ok(regions.into_iter().map(RegionModel::from).collect())
    }
}

#[async_trait]
impl DataSource for RegionsDataSource {
    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn schema(&self) -> Schema {
        Schema::new("Lists the regions available for Prisma Postgres databases.").with_attribute(
            "regions",
            Attribute::computed_list().with_description("Regions with id, name and status."),
        )
    }

    async fn read(&self) -> pgflow_cloud::Result<Attributes> {
        let regions = self.list().await?;
        Ok(to_attributes(&RegionsModel { regions })?)
    }
}
