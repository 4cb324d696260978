//! pgflow.kdl のデータモデル

use pgflow_cloud::ResourceSet;
use std::fmt;

/// サポートするプロバイダー名
pub const PRISMA_PROVIDER: &str = "prisma-postgres";

/// provider ブロックの設定
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub name: String,
    /// 未指定なら環境変数にフォールバック
    pub service_token: Option<String>,
    pub base_url: Option<String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            name: PRISMA_PROVIDER.to_string(),
            service_token: None,
            base_url: None,
        }
    }
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("name", &self.name)
            .field(
                "service_token",
                &self.service_token.as_ref().map(|_| "<redacted>"),
            )
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// パース済みの設定全体
#[derive(Debug, Clone, Default)]
pub struct PgflowConfig {
    pub provider: ProviderSettings,
    /// 宣言されたリソース (project / database / connection)
    pub resources: ResourceSet,
}
