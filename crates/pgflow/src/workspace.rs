//! 設定ファイル・state・プロバイダーの解決

use anyhow::Context;
use pgflow_api::{ClientConfig, PrismaClient};
use pgflow_cloud::{StateLock, StateManager};
use pgflow_config::{ConfigError, PgflowConfig, ProviderSettings};
use pgflow_provider::{PrismaProvider, ProviderConfig};
use std::path::{Path, PathBuf};

/// コマンドラインで指定された接続設定
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub service_token: Option<String>,
    pub base_url: Option<String>,
}

impl Overrides {
    /// コマンドライン > 設定ファイル > 環境変数 の順で解決する設定
    pub fn provider_config(&self, settings: Option<&ProviderSettings>) -> ProviderConfig {
        let mut config = ProviderConfig::new();

        let token = self
            .service_token
            .clone()
            .or_else(|| settings.and_then(|s| s.service_token.clone()));
        if let Some(token) = token {
            config = config.with_service_token(token);
        }

        let base_url = self
            .base_url
            .clone()
            .or_else(|| settings.and_then(|s| s.base_url.clone()));
        if let Some(base_url) = base_url {
            config = config.with_base_url(base_url);
        }

        config
    }
}

/// 読み込み済みの pgflow.kdl とその周辺
pub struct Workspace {
    pub config_path: PathBuf,
    pub config: PgflowConfig,
    overrides: Overrides,
}

impl Workspace {
    pub fn load(path: Option<PathBuf>, overrides: Overrides) -> anyhow::Result<Self> {
        let config_path = match path {
            Some(path) => path,
            None => pgflow_config::find_config_file()?,
        };
        let config = pgflow_config::load_config(&config_path).with_context(|| {
            format!(
                "設定ファイルを読み込めません: {}",
                config_path.display()
            )
        })?;

        Ok(Self {
            config_path,
            config,
            overrides,
        })
    }

    /// 設定ファイルが見つからなければ None
    pub fn load_optional(
        path: Option<PathBuf>,
        overrides: Overrides,
    ) -> anyhow::Result<Option<Self>> {
        if path.is_none() {
            match pgflow_config::find_config_file() {
                Err(ConfigError::ConfigFileNotFound) => return Ok(None),
                Err(e) => return Err(e.into()),
                Ok(found) => return Self::load(Some(found), overrides).map(Some),
            }
        }
        Self::load(path, overrides).map(Some)
    }

    /// .pgflow/ を置くディレクトリ
    pub fn root(&self) -> &Path {
        pgflow_config::project_root(&self.config_path)
    }

    pub fn state_manager(&self) -> StateManager {
        StateManager::new(self.root())
    }

    /// state を変更するコマンド用のロック
    pub async fn lock(&self) -> anyhow::Result<(StateManager, StateLock)> {
        let manager = self.state_manager();
        let lock = manager
            .acquire_lock()
            .await
            .context("state のロックを取得できません")?;
        Ok((manager, lock))
    }

    /// API に接続するプロバイダー
    pub fn provider(&self) -> anyhow::Result<PrismaProvider> {
        let config = self
            .overrides
            .provider_config(Some(&self.config.provider));
        Ok(PrismaProvider::from_config(config)?)
    }
}

/// API に接続しない操作 (スキーマ検証・state表示) 用のプロバイダー
pub fn offline_provider() -> anyhow::Result<PrismaProvider> {
    Ok(PrismaProvider::new(PrismaClient::new(
        ClientConfig::default(),
    )?))
}

/// `<type>.<name>` を state キー `<type>:<name>` に変換
pub fn parse_address(address: &str) -> anyhow::Result<String> {
    match address.split_once('.') {
        Some((resource_type, name)) if !resource_type.is_empty() && !name.is_empty() => {
            Ok(pgflow_cloud::resource_key(resource_type, name))
        }
        _ => Err(anyhow::anyhow!(
            "アドレスは <type>.<name> の形式で指定してください: {}",
            address
        )),
    }
}
