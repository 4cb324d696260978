use super::{ensure_authenticated, load_state, save_state};
use crate::output;
use crate::workspace::{self, Workspace};
use colored::Colorize;
use pgflow_cloud::CloudProvider;

/// `target` を指定した場合はそのリソースだけを削除する
pub async fn handle(ws: &Workspace, target: Option<&str>, yes: bool) -> anyhow::Result<()> {
    let target_key = target.map(workspace::parse_address).transpose()?;

    let (manager, lock) = ws.lock().await?;
    let (global, mut state) = load_state(&manager).await?;

    if state.is_empty() {
        println!("{}", "管理中のリソースはありません".dimmed());
        lock.release().await?;
        return Ok(());
    }

    println!("{}", "削除対象:".bold());
    if let Some(key) = &target_key {
        let resource = state
            .get(key)
            .ok_or_else(|| anyhow::anyhow!("state に {} がありません", target.unwrap_or(key)))?;
        println!("  {} {} ({})", "-".red().bold(), key, resource.id.dimmed());
    } else {
        for (key, resource) in state.iter() {
            println!("  {} {} ({})", "-".red().bold(), key, resource.id.dimmed());
        }
    }

    // 確認（--yesが指定されていない場合）
    if !yes {
        println!();
        println!(
            "{}",
            "警告: 上記のリソースとそのデータを完全に削除します。".yellow()
        );
        println!("実行するには --yes オプションを指定してください");
        lock.release().await?;
        return Ok(());
    }

    let provider = ws.provider()?;
    ensure_authenticated(&provider).await?;
    println!();
    println!("{}", "削除中...".blue());

    if let Some(key) = target_key {
        // 子リソースはリモート側で一緒に消えるので state からも外れる
        let result = provider.destroy(&key, &mut state).await;
        save_state(&manager, global, state).await?;
        lock.release().await?;
        result?;
        println!("{}", format!("✓ {} を削除しました", key).green().bold());
        return Ok(());
    }

    let result = provider.destroy_all(&mut state).await?;

    save_state(&manager, global, state).await?;
    lock.release().await?;

    output::print_apply_result(&result);
    if !result.is_success() {
        return Err(anyhow::anyhow!(
            "{}件のリソースを削除できませんでした",
            result.failed.len()
        ));
    }
    println!("{}", "✓ すべてのリソースを削除しました".green().bold());
    Ok(())
}
