//! Provider registry
//!
//! Maps a provider name to a lazily constructed, process-lifetime analyzer.

use crate::analyzer::{AnalyzerConfig, LlmRiskAnalyzer, RiskAnalyzer};
use crate::config::LlmSettings;
use crate::error::{AnalysisError, Result};
use dashmap::DashMap;
use nathac_llm::{GeminiProvider, LLMClient, OpenAIProvider};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Supported LLM providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAI,
    DeepSeek,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [Self::Gemini, Self::OpenAI, Self::DeepSeek];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAI => "openai",
            Self::DeepSeek => "deepseek",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openai" => Ok(Self::OpenAI),
            "deepseek" => Ok(Self::DeepSeek),
            _ => Err(AnalysisError::UnsupportedProvider(s.to_string())),
        }
    }
}

/// Builds the analyzer for a provider
pub trait AnalyzerFactory: Send + Sync {
    fn build(&self, kind: ProviderKind) -> Result<Arc<dyn RiskAnalyzer>>;
}

/// Factory producing [`LlmRiskAnalyzer`]s over the real vendor clients
pub struct LlmAnalyzerFactory {
    settings: LlmSettings,
}

impl LlmAnalyzerFactory {
    pub fn new(settings: LlmSettings) -> Self {
        Self { settings }
    }
}

impl AnalyzerFactory for LlmAnalyzerFactory {
    fn build(&self, kind: ProviderKind) -> Result<Arc<dyn RiskAnalyzer>> {
        let provider = self.settings.provider(kind);

        let api_key = provider
            .api_key()
            .ok_or_else(|| AnalysisError::MissingCredential {
                provider: kind.to_string(),
            })?
            .to_string();

        let client: Arc<dyn LLMClient> = match kind {
            ProviderKind::Gemini => {
                Arc::new(GeminiProvider::with_base_url(api_key, provider.base_url.clone()))
            }
            ProviderKind::OpenAI => {
                Arc::new(OpenAIProvider::with_base_url(api_key, provider.base_url.clone()))
            }
            ProviderKind::DeepSeek => Arc::new(
                OpenAIProvider::with_base_url(api_key, provider.base_url.clone())
                    .with_name("deepseek"),
            ),
        };

        let mut config = AnalyzerConfig::new(provider.model.clone())
            .with_timeout(Duration::from_secs(self.settings.timeout_secs))
            .with_failure_policy(self.settings.failure_policy);
        config.temperature = self.settings.temperature.or(config.temperature);
        config.max_tokens = self.settings.max_tokens;

        Ok(Arc::new(LlmRiskAnalyzer::new(kind.as_str(), client, config)))
    }
}

/// Lazily constructed, cached analyzers keyed by provider
pub struct ProviderRegistry {
    factory: Arc<dyn AnalyzerFactory>,
    providers: DashMap<ProviderKind, Arc<dyn RiskAnalyzer>>,
}

impl ProviderRegistry {
    /// Create a registry over the real vendor clients
    pub fn new(settings: LlmSettings) -> Self {
        Self::with_factory(Arc::new(LlmAnalyzerFactory::new(settings)))
    }

    /// Create a registry with a custom factory
    pub fn with_factory(factory: Arc<dyn AnalyzerFactory>) -> Self {
        Self {
            factory,
            providers: DashMap::new(),
        }
    }

    /// Resolve a provider by name
    pub fn get(&self, provider_name: &str) -> Result<Arc<dyn RiskAnalyzer>> {
        let kind: ProviderKind = provider_name.parse()?;
        self.get_kind(kind)
    }

    /// Resolve a provider, constructing it on first use
    pub fn get_kind(&self, kind: ProviderKind) -> Result<Arc<dyn RiskAnalyzer>> {
        if let Some(existing) = self.providers.get(&kind) {
            return Ok(existing.value().clone());
        }

        // The entry lock is held during construction, so concurrent first
        // callers for the same provider wait instead of building twice
        let entry = self.providers.entry(kind).or_try_insert_with(|| {
            tracing::info!(provider = %kind, "Initializing LLM provider");
            self.factory.build(kind)
        })?;

        Ok(entry.value().clone())
    }

    /// Whether a provider has already been constructed
    pub fn is_initialized(&self, kind: ProviderKind) -> bool {
        self.providers.contains_key(&kind)
    }
}
