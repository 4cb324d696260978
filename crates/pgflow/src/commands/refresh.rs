use super::{load_state, refresh_state, save_state};
use crate::workspace::Workspace;
use colored::Colorize;

pub async fn handle(ws: &Workspace) -> anyhow::Result<()> {
    let provider = ws.provider()?;
    let (manager, lock) = ws.lock().await?;
    let (global, mut state) = load_state(&manager).await?;

    let removed = refresh_state(&provider, &mut state).await?;
    let remaining = state.len();

    save_state(&manager, global, state).await?;
    lock.release().await?;

    println!(
        "{}",
        format!(
            "✓ {}個のリソースを確認しました (削除 {}個)",
            remaining + removed.len(),
            removed.len()
        )
        .green()
        .bold()
    );
    Ok(())
}
