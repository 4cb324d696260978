use super::{ensure_authenticated, load_state, refresh_state, save_state};
use crate::output;
use crate::workspace::Workspace;
use colored::Colorize;
use pgflow_cloud::CloudProvider;
use tracing::info;

pub async fn handle(ws: &Workspace, yes: bool, refresh: bool) -> anyhow::Result<()> {
    let provider = ws.provider()?;
    provider.validate(&ws.config.resources)?;
    ensure_authenticated(&provider).await?;

    let (manager, lock) = ws.lock().await?;
    let (global, mut state) = load_state(&manager).await?;

    // リモートで消えたリソースは適用しなくても state から外しておく
    if refresh && !refresh_state(&provider, &mut state).await?.is_empty() {
        save_state(&manager, global.clone(), state.clone()).await?;
    }

    println!("{}", "実行計画を作成中...".blue());
    let plan = provider.plan(&ws.config.resources, &state).await?;
    println!();
    output::print_plan(&provider, &plan);

    if !plan.has_changes {
        lock.release().await?;
        return Ok(());
    }

    // 確認（--yesが指定されていない場合）
    if !yes {
        println!();
        println!(
            "{}",
            "警告: 上記の変更をリモートに適用します。".yellow()
        );
        println!("実行するには --yes オプションを指定してください");
        lock.release().await?;
        return Ok(());
    }

    println!();
    println!("{}", "適用中...".blue());
    info!(actions = plan.actions.len(), "Applying plan");
    let result = provider
        .apply(&plan, &ws.config.resources, &mut state)
        .await?;

    // 失敗しても成功分は state に残す
    save_state(&manager, global, state).await?;
    lock.release().await?;

    output::print_apply_result(&result);
    if !result.is_success() {
        return Err(anyhow::anyhow!(
            "{}件のアクションが失敗しました",
            result.failed.len()
        ));
    }
    println!("{}", "✓ 適用が完了しました".green().bold());
    Ok(())
}
