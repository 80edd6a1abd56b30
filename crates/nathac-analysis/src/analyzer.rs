//! Provider adapters: one vendor client behind the `analyze` contract

use crate::error::{AnalysisError, Result};
use crate::models::{AcademicRecord, RiskOutcome, TargetSubject};
use crate::prompt::{build_prompt, SYSTEM_MESSAGE};
use crate::recovery::recover;
use async_trait::async_trait;
use nathac_llm::{LLMClient, LLMRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Per-subject risk analyzer
///
/// Instances are shared by every in-flight task of every batch, so
/// implementations must not keep per-call mutable state.
#[async_trait]
pub trait RiskAnalyzer: Send + Sync {
    /// Provider name this analyzer is bound to
    fn provider(&self) -> &str;

    /// Model identifier used for vendor calls
    fn model_name(&self) -> &str;

    /// Assess one subject against the student's history
    async fn analyze(
        &self,
        subject: &TargetSubject,
        history: &[AcademicRecord],
    ) -> Result<RiskOutcome>;
}

/// What an analyzer does when a vendor call or recovery fails
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Return the error for the caller to handle
    #[default]
    Propagate,
    /// Return a degraded `Unknown` outcome naming the failure
    Degrade,
}

/// Settings for an [`LlmRiskAnalyzer`]
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Model to use (e.g., "gemini-2.0-flash")
    pub model: String,
    /// Per-call timeout
    pub timeout: Duration,
    /// Maximum tokens for response
    pub max_tokens: Option<u32>,
    /// Temperature (lower = more deterministic)
    pub temperature: Option<f32>,
    pub failure_policy: FailurePolicy,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            timeout: Duration::from_secs(30),
            max_tokens: None,
            temperature: Some(0.2),
            failure_policy: FailurePolicy::Propagate,
        }
    }
}

impl AnalyzerConfig {
    /// Create a new configuration with a specific model
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Default::default()
        }
    }

    /// Set per-call timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set maximum tokens
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set failure policy
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }
}

/// Analyzer backed by an [`LLMClient`]
pub struct LlmRiskAnalyzer {
    provider: String,
    client: Arc<dyn LLMClient>,
    config: AnalyzerConfig,
}

impl LlmRiskAnalyzer {
    /// Create a new analyzer
    pub fn new(provider: impl Into<String>, client: Arc<dyn LLMClient>, config: AnalyzerConfig) -> Self {
        Self {
            provider: provider.into(),
            client,
            config,
        }
    }

    /// Get current configuration
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    async fn analyze_once(
        &self,
        subject: &TargetSubject,
        history: &[AcademicRecord],
    ) -> Result<RiskOutcome> {
        let prompt = build_prompt(subject, history);

        let mut request = LLMRequest::new(prompt, self.config.model.clone())
            .with_system(SYSTEM_MESSAGE.to_string())
            .with_json_mode(true);
        if let Some(max_tokens) = self.config.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        if let Some(temperature) = self.config.temperature {
            request = request.with_temperature(temperature);
        }

        tracing::debug!(
            provider = %self.provider,
            model = %self.config.model,
            subject = %subject.subject_code,
            prompt_length = request.prompt.len(),
            "Requesting risk analysis"
        );

        let response = tokio::time::timeout(self.config.timeout, self.client.call(request))
            .await
            .map_err(|_| AnalysisError::Timeout(self.config.timeout))??;

        let mut outcome = recover(&response.content)?;

        // Outcomes are correlated by position and code; never trust the echo
        if outcome.subject_code != subject.subject_code {
            tracing::warn!(
                provider = %self.provider,
                expected = %subject.subject_code,
                returned = %outcome.subject_code,
                "Model echoed a different subject code, overriding"
            );
            outcome.subject_code = subject.subject_code.clone();
        }
        if outcome.subject_name.is_none() {
            outcome.subject_name = subject.subject_name.clone();
        }

        Ok(outcome)
    }
}

#[async_trait]
impl RiskAnalyzer for LlmRiskAnalyzer {
    fn provider(&self) -> &str {
        &self.provider
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    async fn analyze(
        &self,
        subject: &TargetSubject,
        history: &[AcademicRecord],
    ) -> Result<RiskOutcome> {
        match self.analyze_once(subject, history).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                tracing::error!(
                    provider = %self.provider,
                    subject = %subject.subject_code,
                    failure = e.failure_class().as_str(),
                    error = %e,
                    "Risk analysis failed"
                );
                match self.config.failure_policy {
                    FailurePolicy::Propagate => Err(e),
                    FailurePolicy::Degrade => Ok(RiskOutcome::degraded(
                        subject,
                        e.failure_class(),
                        &e.to_string(),
                    )),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureClass;
    use crate::models::{DependencySignal, RiskLevel};
    use nathac_llm::MockProvider;

    const MATH201_RESPONSE: &str = r#"{
        "subject_code": "MATH201",
        "risk_level": "High",
        "key_signals": [{"signal": "WeakAlgebra", "description": "External mark 21/75 in MATH101"}],
        "risk_drivers": ["low MATH101 score"],
        "recommended_focus": ["review algebra"]
    }"#;

    fn math201() -> TargetSubject {
        TargetSubject::new("MATH201")
            .with_name("Calculus II")
            .with_dependency(DependencySignal {
                subject_code: "MATH101".to_string(),
                subject_name: None,
                weight: 5.0,
                reason: None,
            })
    }

    fn analyzer(client: MockProvider, policy: FailurePolicy) -> LlmRiskAnalyzer {
        LlmRiskAnalyzer::new(
            "mock",
            Arc::new(client),
            AnalyzerConfig::new("mock-model")
                .with_timeout(Duration::from_secs(30))
                .with_failure_policy(policy),
        )
    }

    #[tokio::test]
    async fn test_analyze_success() {
        let analyzer = analyzer(
            MockProvider::with_response(MATH201_RESPONSE.to_string()),
            FailurePolicy::Propagate,
        );

        let outcome = analyzer.analyze(&math201(), &[]).await.unwrap();
        assert_eq!(outcome.subject_code, "MATH201");
        assert_eq!(outcome.subject_name.as_deref(), Some("Calculus II"));
        assert_eq!(outcome.risk_level, RiskLevel::High);
        assert_eq!(outcome.risk_drivers, vec!["low MATH101 score".to_string()]);
        assert_eq!(analyzer.provider(), "mock");
        assert_eq!(analyzer.model_name(), "mock-model");
    }

    #[tokio::test]
    async fn test_analyze_fenced_response() {
        let fenced = format!("```json\n{}\n```", MATH201_RESPONSE);
        let analyzer = analyzer(MockProvider::with_response(fenced), FailurePolicy::Propagate);

        let outcome = analyzer.analyze(&math201(), &[]).await.unwrap();
        assert_eq!(outcome.risk_level, RiskLevel::High);
    }

    #[tokio::test]
    async fn test_mismatched_subject_code_is_overridden() {
        let response = MATH201_RESPONSE.replace("MATH201", "math-201");
        let analyzer = analyzer(MockProvider::with_response(response), FailurePolicy::Propagate);

        let outcome = analyzer.analyze(&math201(), &[]).await.unwrap();
        assert_eq!(outcome.subject_code, "MATH201");
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let analyzer = analyzer(MockProvider::failing("503 overloaded"), FailurePolicy::Propagate);

        let err = analyzer.analyze(&math201(), &[]).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Provider(_)));
    }

    #[tokio::test]
    async fn test_malformed_output_propagates() {
        let analyzer = analyzer(
            MockProvider::with_response("I cannot answer that.".to_string()),
            FailurePolicy::Propagate,
        );

        let err = analyzer.analyze(&math201(), &[]).await.unwrap_err();
        assert_eq!(err.failure_class(), FailureClass::MalformedOutput);
    }

    #[tokio::test]
    async fn test_degrade_policy_synthesizes_unknown() {
        let analyzer = analyzer(MockProvider::failing("connection reset"), FailurePolicy::Degrade);

        let outcome = analyzer.analyze(&math201(), &[]).await.unwrap();
        assert_eq!(outcome.risk_level, RiskLevel::Unknown);
        assert_eq!(outcome.subject_code, "MATH201");
        assert!(outcome.risk_drivers[0].contains("model/network failure"));
        assert!(outcome.risk_drivers[0].contains("connection reset"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_call_times_out() {
        let client = MockProvider::with_response(MATH201_RESPONSE.to_string())
            .with_delay(Duration::from_secs(120));
        let analyzer = analyzer(client, FailurePolicy::Propagate);

        let err = analyzer.analyze(&math201(), &[]).await.unwrap_err();
        assert!(matches!(err, AnalysisError::Timeout(d) if d == Duration::from_secs(30)));
        assert_eq!(err.failure_class(), FailureClass::Provider);
    }

    #[tokio::test]
    async fn test_exactly_one_vendor_call_per_analysis() {
        let client = Arc::new(MockProvider::with_response(MATH201_RESPONSE.to_string()));
        let analyzer = LlmRiskAnalyzer::new("mock", client.clone(), AnalyzerConfig::new("m"));

        analyzer.analyze(&math201(), &[]).await.unwrap();
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn test_failure_policy_serde() {
        let policy: FailurePolicy = serde_json::from_str("\"degrade\"").unwrap();
        assert_eq!(policy, FailurePolicy::Degrade);
        assert_eq!(FailurePolicy::default(), FailurePolicy::Propagate);
    }
}
