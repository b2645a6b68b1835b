//! Process Configuration
//!
//! One read-only configuration value, constructed once from the
//! environment and passed by reference into every component. Credential
//! validation for the selected backend happens at provider construction;
//! a missing key there is fatal, never deferred to call time.

use std::sync::Arc;

use research_core::error::{AgentError, Result};
use research_core::provider::{LlmProvider, RetryPolicy};

use crate::anthropic::AnthropicProvider;
use crate::openai::OpenAiProvider;

/// Supported reasoning backends
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    OpenAi,
    Anthropic,
    Together,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::Together => "together",
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "anthropic" => Ok(ProviderKind::Anthropic),
            "together" | "togetherai" => Ok(ProviderKind::Together),
            other => Err(AgentError::Config(format!(
                "unknown provider '{other}'; supported providers: 'openai', 'anthropic', 'together'"
            ))),
        }
    }
}

/// Read-only process configuration
#[derive(Clone, Debug)]
pub struct LlmConfig {
    /// The single active backend
    pub provider: ProviderKind,

    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub together_api_key: Option<String>,

    pub openai_model: String,
    pub anthropic_model: String,
    pub together_model: String,

    /// API key for the Tavily search tool
    pub tavily_api_key: Option<String>,

    /// Provider retry ceiling
    pub max_retry_attempts: u32,
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(name: &str, default: &str) -> String {
    env_opt(name).unwrap_or_else(|| default.into())
}

impl LlmConfig {
    /// Load configuration from the environment
    pub fn from_env() -> Result<Self> {
        let provider = env_or("PREFERRED_AI_MODEL_PROVIDER", "openai").parse()?;

        Ok(Self {
            provider,
            openai_api_key: env_opt("OPENAI_API_KEY"),
            anthropic_api_key: env_opt("ANTHROPIC_API_KEY"),
            together_api_key: env_opt("TOGETHER_AI_API_KEY"),
            openai_model: env_or("PRIMARY_OPENAI_MODEL_NAME", "gpt-4o-mini"),
            anthropic_model: env_or("PRIMARY_ANTHROPIC_MODEL_NAME", "claude-3-5-haiku-latest"),
            together_model: env_or(
                "PRIMARY_TOGETHER_MODEL_NAME",
                "meta-llama/Llama-3.3-70B-Instruct-Turbo",
            ),
            tavily_api_key: env_opt("TAVILY_API_KEY"),
            max_retry_attempts: env_opt("MAX_RETRY_ATTEMPTS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(3),
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retry_attempts)
    }

    /// Construct the adapter for the selected backend.
    ///
    /// Fails immediately and descriptively when the chosen provider lacks a
    /// usable credential; this is a fatal configuration error, not a
    /// runtime retry case.
    pub fn build_provider(&self) -> Result<Arc<dyn LlmProvider>> {
        let missing_key = |var: &str| {
            AgentError::Config(format!(
                "provider '{}' selected but {var} is not set",
                self.provider.as_str()
            ))
        };

        let provider: Arc<dyn LlmProvider> = match self.provider {
            ProviderKind::OpenAi => {
                let key = self
                    .openai_api_key
                    .clone()
                    .ok_or_else(|| missing_key("OPENAI_API_KEY"))?;
                Arc::new(OpenAiProvider::openai(
                    key,
                    self.openai_model.clone(),
                    self.retry_policy(),
                ))
            }
            ProviderKind::Anthropic => {
                let key = self
                    .anthropic_api_key
                    .clone()
                    .ok_or_else(|| missing_key("ANTHROPIC_API_KEY"))?;
                Arc::new(AnthropicProvider::new(
                    key,
                    self.anthropic_model.clone(),
                    self.retry_policy(),
                ))
            }
            ProviderKind::Together => {
                let key = self
                    .together_api_key
                    .clone()
                    .ok_or_else(|| missing_key("TOGETHER_AI_API_KEY"))?;
                Arc::new(OpenAiProvider::together(
                    key,
                    self.together_model.clone(),
                    self.retry_policy(),
                ))
            }
        };

        tracing::info!(provider = provider.name(), "provider adapter constructed");
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: ProviderKind) -> LlmConfig {
        LlmConfig {
            provider,
            openai_api_key: None,
            anthropic_api_key: None,
            together_api_key: None,
            openai_model: "gpt-4o-mini".into(),
            anthropic_model: "claude-3-5-haiku-latest".into(),
            together_model: "llama".into(),
            tavily_api_key: None,
            max_retry_attempts: 3,
        }
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("openai".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!(
            "Anthropic".parse::<ProviderKind>().unwrap(),
            ProviderKind::Anthropic
        );
        assert_eq!(
            "togetherai".parse::<ProviderKind>().unwrap(),
            ProviderKind::Together
        );
        assert!("google".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_missing_credential_is_fatal_at_construction() {
        let result = config(ProviderKind::Anthropic).build_provider();
        match result {
            Err(AgentError::Config(msg)) => {
                assert!(msg.contains("ANTHROPIC_API_KEY"));
                assert!(msg.contains("anthropic"));
            }
            other => panic!("expected Config error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_selected_provider_builds_with_credential() {
        let mut cfg = config(ProviderKind::OpenAi);
        cfg.openai_api_key = Some("sk-test".into());
        let provider = cfg.build_provider().unwrap();
        assert_eq!(provider.name(), "openai");
    }

    #[test]
    fn test_unrelated_credentials_do_not_satisfy_selection() {
        let mut cfg = config(ProviderKind::Together);
        cfg.openai_api_key = Some("sk-test".into());
        assert!(cfg.build_provider().is_err());
    }
}
