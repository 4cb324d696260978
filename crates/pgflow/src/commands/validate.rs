use crate::workspace::{self, Workspace};
use colored::Colorize;

pub fn handle(ws: &Workspace) -> anyhow::Result<()> {
    println!("{}", "設定を検証中...".blue());
    println!(
        "設定ファイル: {}",
        ws.config_path.display().to_string().cyan()
    );

    // スキーマ検証はAPIに接続しない
    let provider = workspace::offline_provider()?;
    if let Err(e) = provider.validate(&ws.config.resources) {
        eprintln!();
        eprintln!("{}", "✗ 設定エラー".red().bold());
        for problem in e.to_string().split("; ") {
            eprintln!("  {}", problem);
        }
        std::process::exit(1);
    }

    println!("{}", "✓ 設定ファイルは正常です！".green().bold());
    println!();
    println!("サマリー:");
    println!("  プロバイダー: {}", ws.config.provider.name.cyan());
    for resource_type in provider.resource_types() {
        let resources = ws.config.resources.by_type(resource_type);
        if resources.is_empty() {
            continue;
        }
        println!("  {}: {}個", resource_type, resources.len());
        for resource in resources {
            let name = resource
                .get_config::<String>("name")
                .unwrap_or_else(|| "(未設定)".to_string());
            let parent = resource
                .references
                .values()
                .next()
                .map(|r| format!(" → {}.{}", r.resource_type, r.name))
                .unwrap_or_default();
            println!("    - {} ({}){}", resource.name.cyan(), name, parent);
        }
    }

    Ok(())
}
