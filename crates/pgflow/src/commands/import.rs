use super::{load_state, save_state};
use crate::workspace::Workspace;
use colored::Colorize;
use pgflow_cloud::CloudProvider;

pub async fn handle(
    ws: &Workspace,
    resource_type: &str,
    name: &str,
    id: &str,
) -> anyhow::Result<()> {
    let provider = ws.provider()?;
    let (manager, lock) = ws.lock().await?;
    let (global, mut state) = load_state(&manager).await?;

    println!(
        "{}",
        format!("{}.{} をインポート中...", resource_type, name).blue()
    );
    let imported = provider.import(resource_type, name, id, &mut state).await?;

    save_state(&manager, global, state).await?;
    lock.release().await?;

    println!(
        "{}",
        format!("✓ インポートしました: {}", imported.id).green().bold()
    );
    if !ws.config.resources.contains(resource_type, name) {
        println!(
            "{}",
            format!(
                "注意: pgflow.kdl に {} \"{}\" がありません。次の apply で削除されます",
                resource_type, name
            )
            .yellow()
        );
    }
    Ok(())
}
