//! Provider configuration
//!
//! Explicit values (from `pgflow.kdl` or CLI flags) win over environment
//! variables. Empty strings count as unset.

use crate::error::{PrismaError, Result};
use pgflow_api::{ClientConfig, PrismaClient};

pub const SERVICE_TOKEN_ENV: &str = "PRISMA_SERVICE_TOKEN";
pub const BASE_URL_ENV: &str = "PRISMA_API_BASE_URL";

#[derive(Clone, Default)]
pub struct ProviderConfig {
    pub service_token: Option<String>,
    pub base_url: Option<String>,
    pub user_agent: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field(
                "service_token",
                &self.service_token.as_ref().map(|_| pgflow_cloud::REDACTED),
            )
            .field("base_url", &self.base_url)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn from_env(name: &str) -> Option<String> {
    non_empty(std::env::var(name).ok())
}

impl ProviderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_service_token(mut self, token: impl Into<String>) -> Self {
        self.service_token = Some(token.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Resolve against the environment into a client configuration
    pub fn resolve(self) -> Result<ClientConfig> {
        let service_token = non_empty(self.service_token)
            .or_else(|| from_env(SERVICE_TOKEN_ENV))
            .ok_or(PrismaError::MissingServiceToken)?;

        let mut config = ClientConfig::new(service_token);

        if let Some(base_url) = non_empty(self.base_url).or_else(|| from_env(BASE_URL_ENV)) {
            if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
                return Err(PrismaError::InvalidBaseUrl(base_url));
            }
            tracing::debug!("Using API base URL {}", base_url);
            config = config.with_base_url(base_url);
        }

        if let Some(user_agent) = non_empty(self.user_agent) {
            config = config.with_user_agent(user_agent);
        }

        Ok(config)
    }

    /// Resolve and build the API client
    pub fn client(self) -> Result<PrismaClient> {
        Ok(PrismaClient::new(self.resolve()?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_explicit_token_wins() {
        temp_env::with_var(SERVICE_TOKEN_ENV, Some("from-env"), || {
            let config = ProviderConfig::new()
                .with_service_token("explicit")
                .resolve()
                .unwrap();
            assert_eq!(config.service_token, "explicit");
        });
    }

    #[test]
    #[serial]
    fn test_env_token_fallback() {
        temp_env::with_vars(
            [
                (SERVICE_TOKEN_ENV, Some("from-env")),
                (BASE_URL_ENV, Some("http://localhost:9999")),
            ],
            || {
                let config = ProviderConfig::new().with_service_token("").resolve().unwrap();
                assert_eq!(config.service_token, "from-env");
                assert_eq!(config.base_url.as_deref(), Some("http://localhost:9999"));
            },
        );
    }

    #[test]
    #[serial]
    fn test_missing_token() {
        temp_env::with_var_unset(SERVICE_TOKEN_ENV, || {
            let err = ProviderConfig::new().resolve().unwrap_err();
            assert!(matches!(err, PrismaError::MissingServiceToken));
        });
    }

    #[test]
    #[serial]
    fn test_explicit_base_url_wins() {
        temp_env::with_var(BASE_URL_ENV, Some("http://from-env"), || {
            let client = ProviderConfig::new()
                .with_service_token("t")
                .with_base_url("https://explicit.example/")
                .client()
                .unwrap();
            assert_eq!(client.base_url(), "https://explicit.example");
            assert!(client.user_agent().starts_with("pgflow/"));
        });
    }

    #[test]
    #[serial]
    fn test_relative_base_url_rejected() {
        temp_env::with_var_unset(BASE_URL_ENV, || {
            let err = ProviderConfig::new()
                .with_service_token("t")
                .with_base_url("api.prisma.io")
                .resolve()
                .unwrap_err();
            assert!(matches!(err, PrismaError::InvalidBaseUrl(_)));
        });
    }

    #[test]
    fn test_debug_hides_token() {
        let config = ProviderConfig::new().with_service_token("super-secret");
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}
