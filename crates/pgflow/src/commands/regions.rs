use crate::workspace::{Overrides, Workspace};
use colored::Colorize;
use std::path::PathBuf;

/// 設定ファイルがなくてもトークンがあれば実行できる
pub async fn handle(config: Option<PathBuf>, overrides: Overrides) -> anyhow::Result<()> {
    let provider = match Workspace::load_optional(config, overrides.clone())? {
        Some(ws) => ws.provider()?,
        None => pgflow_provider::PrismaProvider::from_config(overrides.provider_config(None))?,
    };

    let regions = provider.regions().await?;
    println!("{}", "利用可能なリージョン:".bold());
    for region in regions {
        let status = if region.status == "available" {
            region.status.green()
        } else {
            region.status.yellow()
        };
        println!("  {:<16} {:<28} {}", region.id.cyan(), region.name, status);
    }
    Ok(())
}
