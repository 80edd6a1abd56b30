//! Application configuration

use crate::analyzer::FailurePolicy;
use crate::registry::ProviderKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How much of the student's history each subject's prompt sees
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryScope {
    /// Every completed course
    #[default]
    Full,
    /// Only courses listed as the subject's dependencies
    Dependencies,
}

/// Vendor settings for one provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// API key; `None` or empty fails provider construction
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier
    pub model: String,

    /// Endpoint base URL
    pub base_url: String,
}

impl ProviderSettings {
    fn new(model: &str, base_url: &str) -> Self {
        Self {
            api_key: None,
            model: model.to_string(),
            base_url: base_url.to_string(),
        }
    }

    /// Built-in model and endpoint for a provider
    pub fn default_for(kind: ProviderKind) -> Self {
        match kind {
            ProviderKind::Gemini => default_gemini(),
            ProviderKind::OpenAI => default_openai(),
            ProviderKind::DeepSeek => default_deepseek(),
        }
    }

    /// API key if present and non-blank
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

fn default_gemini() -> ProviderSettings {
    ProviderSettings::new(
        "gemini-2.0-flash",
        "https://generativelanguage.googleapis.com/v1beta",
    )
}

fn default_openai() -> ProviderSettings {
    ProviderSettings::new("gpt-4o-mini", "https://api.openai.com/v1")
}

fn default_deepseek() -> ProviderSettings {
    ProviderSettings::new("deepseek-chat", "https://api.deepseek.com/v1")
}

fn default_timeout_secs() -> u64 {
    30
}

/// LLM settings shared by all providers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    #[serde(default = "default_gemini")]
    pub gemini: ProviderSettings,

    #[serde(default = "default_openai")]
    pub openai: ProviderSettings,

    #[serde(default = "default_deepseek")]
    pub deepseek: ProviderSettings,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Per-call failure handling inside adapters
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    #[serde(default)]
    pub history_scope: HistoryScope,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            gemini: default_gemini(),
            openai: default_openai(),
            deepseek: default_deepseek(),
            timeout_secs: default_timeout_secs(),
            temperature: None,
            max_tokens: None,
            failure_policy: FailurePolicy::default(),
            history_scope: HistoryScope::default(),
        }
    }
}

impl LlmSettings {
    /// Settings for one provider
    pub fn provider(&self, kind: ProviderKind) -> &ProviderSettings {
        match kind {
            ProviderKind::Gemini => &self.gemini,
            ProviderKind::OpenAI => &self.openai,
            ProviderKind::DeepSeek => &self.deepseek,
        }
    }

    fn provider_mut(&mut self, kind: ProviderKind) -> &mut ProviderSettings {
        match kind {
            ProviderKind::Gemini => &mut self.gemini,
            ProviderKind::OpenAI => &mut self.openai,
            ProviderKind::DeepSeek => &mut self.deepseek,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Log level used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub llm: LlmSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            llm: LlmSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from `.env`, `config/nathac.*` and environment variables
    ///
    /// Nested keys use `__` as separator, e.g. `NATHAC__LLM__TIMEOUT_SECS=10`.
    /// Vendor keys also fall back to `GEMINI_API_KEY`, `OPENAI_API_KEY` and
    /// `DEEPSEEK_API_KEY`.
    pub fn load() -> anyhow::Result<Self> {
        // Load .env file if exists
        dotenvy::dotenv().ok();
        Self::load_from(Path::new("config/nathac"))
    }

    /// Load configuration with an explicit config file base path
    ///
    /// Provider sections may be partial; unset fields keep the provider's
    /// built-in model and endpoint.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();
        for kind in ProviderKind::ALL {
            let defaults = ProviderSettings::default_for(kind);
            builder = builder
                .set_default(format!("llm.{}.model", kind), defaults.model)
                .and_then(|b| b.set_default(format!("llm.{}.base_url", kind), defaults.base_url))
                .map_err(|e| anyhow::anyhow!("Failed to set config defaults: {}", e))?;
        }

        let cfg = builder
            .add_source(config::File::from(path).required(false))
            .add_source(
                config::Environment::with_prefix("NATHAC")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build config: {}", e))?;

        let mut app: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize config: {}", e))?;

        app.apply_vendor_env(|name| std::env::var(name).ok());
        app.validate()?;
        Ok(app)
    }

    /// Reject settings that would make every analysis fail
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.llm.timeout_secs == 0 {
            anyhow::bail!("llm.timeout_secs must be greater than 0");
        }
        Ok(())
    }

    /// Fill unset vendor keys and models from conventional variable names
    pub fn apply_vendor_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        for kind in ProviderKind::ALL {
            let prefix = kind.as_str().to_ascii_uppercase();
            let settings = self.llm.provider_mut(kind);

            if settings.api_key().is_none() {
                if let Some(key) = lookup(&format!("{}_API_KEY", prefix)) {
                    settings.api_key = Some(key);
                }
            }
            if let Some(model) = lookup(&format!("{}_MODEL", prefix)) {
                if !model.trim().is_empty() {
                    settings.model = model;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();

        assert_eq!(config.log_level, "info");
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.llm.failure_policy, FailurePolicy::Propagate);
        assert_eq!(config.llm.history_scope, HistoryScope::Full);
        assert_eq!(config.llm.gemini.model, "gemini-2.0-flash");
        assert_eq!(config.llm.deepseek.base_url, "https://api.deepseek.com/v1");
        assert!(config.llm.openai.api_key().is_none());
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let mut settings = default_openai();
        settings.api_key = Some("   ".to_string());
        assert!(settings.api_key().is_none());
    }

    #[test]
    fn test_apply_vendor_env() {
        let vars: HashMap<&str, &str> = [
            ("GEMINI_API_KEY", "g-key"),
            ("OPENAI_MODEL", "gpt-4o"),
            ("DEEPSEEK_API_KEY", "d-key"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.llm.deepseek.api_key = Some("configured".to_string());
        config.apply_vendor_env(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.llm.gemini.api_key(), Some("g-key"));
        assert_eq!(config.llm.openai.model, "gpt-4o");
        assert!(config.llm.openai.api_key().is_none());
        // Explicit configuration wins over the conventional variable
        assert_eq!(config.llm.deepseek.api_key(), Some("configured"));
    }

    #[test]
    fn test_load_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nathac.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
log_level = "debug"

[llm]
timeout_secs = 5
failure_policy = "degrade"
history_scope = "dependencies"

[llm.openai]
api_key = "sk-file"
model = "gpt-4.1-mini"
base_url = "http://localhost:9000/v1"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(&path).unwrap();

        assert_eq!(config.log_level, "debug");
        assert_eq!(config.llm.timeout_secs, 5);
        assert_eq!(config.llm.failure_policy, FailurePolicy::Degrade);
        assert_eq!(config.llm.history_scope, HistoryScope::Dependencies);
        assert_eq!(config.llm.openai.api_key(), Some("sk-file"));
        assert_eq!(config.llm.openai.base_url, "http://localhost:9000/v1");
        assert_eq!(config.llm.gemini.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_partial_provider_section_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nathac.toml");
        std::fs::write(&path, "[llm.openai]\napi_key = \"sk-file\"\n").unwrap();

        let config = AppConfig::load_from(&path).unwrap();

        assert_eq!(config.llm.openai.api_key(), Some("sk-file"));
        assert_eq!(config.llm.openai.model, "gpt-4o-mini");
        assert_eq!(config.llm.openai.base_url, "https://api.openai.com/v1");
        assert_eq!(config.llm.gemini.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_env_only_api_key() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("NATHAC__LLM__DEEPSEEK__API_KEY", "d-env");

        let result = AppConfig::load_from(&dir.path().join("missing"));
        std::env::remove_var("NATHAC__LLM__DEEPSEEK__API_KEY");

        let config = result.unwrap();
        assert_eq!(config.llm.deepseek.api_key(), Some("d-env"));
        assert_eq!(config.llm.deepseek.model, "deepseek-chat");
        assert_eq!(config.llm.deepseek.base_url, "https://api.deepseek.com/v1");
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nathac.toml");
        std::fs::write(&path, "[llm]\ntimeout_secs = 0\n").unwrap();

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));
    }
}
