use super::{load_state, save_state};
use crate::workspace::{self, Workspace};
use colored::Colorize;

/// state 内のリソース一覧
pub async fn list(ws: &Workspace) -> anyhow::Result<()> {
    let (_, state) = load_state(&ws.state_manager()).await?;

    if state.is_empty() {
        println!("{}", "state は空です".dimmed());
        return Ok(());
    }

    for (key, resource) in state.iter() {
        println!(
            "{:<32} {:<24} {}",
            key.replacen(':', ".", 1).cyan(),
            resource.id,
            resource.status
        );
    }
    Ok(())
}

/// リソースの詳細を表示
pub async fn show(ws: &Workspace, address: &str, show_sensitive: bool) -> anyhow::Result<()> {
    let key = workspace::parse_address(address)?;
    let (_, state) = load_state(&ws.state_manager()).await?;
    let resource = state
        .get(&key)
        .ok_or_else(|| anyhow::anyhow!("state に {} がありません", address))?;

    let attributes = if show_sensitive {
        resource.attributes.clone()
    } else {
        let provider = workspace::offline_provider()?;
        provider
            .schema(&resource.resource_type)?
            .redact(&resource.attributes)
    };

    println!("{}", address.cyan().bold());
    println!("  id:         {}", resource.id);
    println!("  type:       {}", resource.resource_type);
    println!("  status:     {}", resource.status);
    println!("  created_at: {}", resource.created_at.to_rfc3339());
    println!("  updated_at: {}", resource.updated_at.to_rfc3339());
    println!("  attributes:");
    for (name, value) in &attributes {
        let value = match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        println!("    {} = {}", name, value);
    }
    Ok(())
}

/// リソースを state から外す
pub async fn rm(ws: &Workspace, address: &str) -> anyhow::Result<()> {
    let key = workspace::parse_address(address)?;
    let (manager, lock) = ws.lock().await?;
    let (global, mut state) = load_state(&manager).await?;

    let removed = state
        .remove(&key)
        .ok_or_else(|| anyhow::anyhow!("state に {} がありません", address))?;

    save_state(&manager, global, state).await?;
    lock.release().await?;

    println!(
        "{}",
        format!("✓ {} ({}) を state から外しました", address, removed.id)
            .green()
            .bold()
    );
    println!(
        "{}",
        "リモートのリソースは削除されていません".dimmed()
    );
    Ok(())
}
