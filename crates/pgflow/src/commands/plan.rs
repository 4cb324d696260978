use super::{load_state, refresh_state};
use crate::output;
use crate::workspace::Workspace;
use colored::Colorize;
use pgflow_cloud::CloudProvider;

/// `refresh` が false なら state をそのまま使う。plan は state を書き換えない
pub async fn handle(ws: &Workspace, refresh: bool) -> anyhow::Result<()> {
    let provider = ws.provider()?;
    provider.validate(&ws.config.resources)?;

    let (_, mut state) = load_state(&ws.state_manager()).await?;
    if refresh {
        refresh_state(&provider, &mut state).await?;
    }

    println!("{}", "実行計画を作成中...".blue());
    let plan = provider.plan(&ws.config.resources, &state).await?;

    println!();
    output::print_plan(&provider, &plan);
    if plan.has_changes {
        println!();
        println!("{}", "適用するには: pgflow apply --yes".dimmed());
    }
    Ok(())
}
