mod commands;
mod output;
mod workspace;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pgflow")]
#[command(about = "Prisma Postgres を宣言的に。", long_about = None)]
struct Cli {
    /// 設定ファイルのパス (省略時は pgflow.kdl を自動検出)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// サービストークン (省略時は設定ファイル、PRISMA_SERVICE_TOKEN の順)
    #[arg(long, global = true)]
    service_token: Option<String>,

    /// API のベースURL (省略時は設定ファイル、PRISMA_API_BASE_URL の順)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// 詳細ログを表示
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 設定を検証
    Validate,
    /// 実行計画を表示
    Plan {
        /// リモートの状態を確認せず state のまま計画する
        #[arg(long)]
        no_refresh: bool,
    },
    /// 実行計画を適用
    Apply {
        /// 確認なしで実行
        #[arg(short, long)]
        yes: bool,
        /// リモートの状態を確認せず state のまま計画する
        #[arg(long)]
        no_refresh: bool,
    },
    /// state を実際のリソースに合わせて更新
    Refresh,
    /// 管理中のリソースを削除
    Destroy {
        /// 削除するリソース <type>.<name> (省略時はすべて)
        #[arg(short, long)]
        target: Option<String>,
        /// 確認なしで実行
        #[arg(short, long)]
        yes: bool,
    },
    /// 既存リソースを state に取り込む
    Import {
        /// リソースタイプ (project, database, connection)
        resource_type: String,
        /// pgflow.kdl 上の名前
        name: String,
        /// リソースID (connection は <database_id>,<connection_id>)
        id: String,
    },
    /// state の操作
    #[command(subcommand)]
    State(StateCommands),
    /// 利用可能なリージョンを表示
    Regions,
    /// バージョン情報を表示
    Version,
}

#[derive(Subcommand)]
enum StateCommands {
    /// state 内のリソース一覧
    List,
    /// リソースの詳細を表示
    Show {
        /// <type>.<name> (例: database.prod)
        address: String,
        /// 機密値も表示
        #[arg(long)]
        show_sensitive: bool,
    },
    /// リソースを state から外す (リモートは削除しない)
    Rm {
        /// <type>.<name> (例: database.prod)
        address: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // ログはstderrへ。RUST_LOG があればそちらを優先
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    // Versionコマンドは設定ファイル不要
    if matches!(cli.command, Commands::Version) {
        println!("pgflow {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let overrides = workspace::Overrides {
        service_token: cli.service_token,
        base_url: cli.base_url,
    };
    // Regionsコマンドは設定ファイルがなくても実行できる
    if matches!(cli.command, Commands::Regions) {
        return commands::regions::handle(cli.config, overrides).await;
    }

    let ws = workspace::Workspace::load(cli.config, overrides)?;

    match cli.command {
        Commands::Validate => commands::validate::handle(&ws)?,
        Commands::Plan { no_refresh } => commands::plan::handle(&ws, !no_refresh).await?,
        Commands::Apply { yes, no_refresh } => {
            commands::apply::handle(&ws, yes, !no_refresh).await?
        }
        Commands::Refresh => commands::refresh::handle(&ws).await?,
        Commands::Destroy { target, yes } => {
            commands::destroy::handle(&ws, target.as_deref(), yes).await?
        }
        Commands::Import {
            resource_type,
            name,
            id,
        } => commands::import::handle(&ws, &resource_type, &name, &id).await?,
        Commands::State(state_cmd) => match state_cmd {
            StateCommands::List => commands::state::list(&ws).await?,
            StateCommands::Show {
                address,
                show_sensitive,
            } => commands::state::show(&ws, &address, show_sensitive).await?,
            StateCommands::Rm { address } => commands::state::rm(&ws, &address).await?,
        },
        Commands::Regions | Commands::Version => {
            unreachable!("Regions and Version are handled before config loading");
        }
    }

    Ok(())
}
