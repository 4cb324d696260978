pub mod apply;
pub mod destroy;
pub mod import;
pub mod plan;
pub mod refresh;
pub mod regions;
pub mod state;
pub mod validate;

use colored::Colorize;
use pgflow_cloud::{CloudProvider, GlobalState, ProviderState, StateManager};
use pgflow_provider::{PROVIDER_NAME, PrismaProvider};

/// state ファイルからプロバイダー分の state を読み込む
pub(crate) async fn load_state(
    manager: &StateManager,
) -> anyhow::Result<(GlobalState, ProviderState)> {
    let global = manager.load().await?;
    let state = global.provider_state(PROVIDER_NAME);
    Ok((global, state))
}

/// プロバイダー分の state を書き戻して保存
pub(crate) async fn save_state(
    manager: &StateManager,
    mut global: GlobalState,
    state: ProviderState,
) -> anyhow::Result<()> {
    global.set_provider_state(PROVIDER_NAME, state);
    manager.save(&global).await?;
    tracing::debug!(path = %manager.state_path().display(), "State saved");
    Ok(())
}

/// リモートを変更する前にトークンを確認
pub(crate) async fn ensure_authenticated(provider: &PrismaProvider) -> anyhow::Result<()> {
    let status = provider.check_auth().await?;
    if !status.authenticated {
        return Err(anyhow::anyhow!(
            "認証に失敗しました: {}",
            status.error.unwrap_or_default()
        ));
    }
    if let Some(info) = status.account_info {
        tracing::debug!(account = %info, "Authenticated");
    }
    Ok(())
}

/// state をリモートの実態に合わせる。消えていたリソースのキーを返す
pub(crate) async fn refresh_state(
    provider: &PrismaProvider,
    state: &mut ProviderState,
) -> anyhow::Result<Vec<String>> {
    if state.is_empty() {
        return Ok(Vec::new());
    }
    println!("{}", "state を更新中...".blue());
    let removed = provider.refresh(state).await?;
    for key in &removed {
        println!("  {} {} (リモートに存在しません)", "-".red().bold(), key);
    }
    Ok(removed)
}
