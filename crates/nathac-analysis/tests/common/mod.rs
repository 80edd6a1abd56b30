//! Common test utilities for analysis integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use nathac_analysis::{
    AcademicRecord, AnalysisError, AnalyzerFactory, DependencySignal, ExternalScore,
    InternalScore, KeySignal, ProviderKind, RiskAnalyzer, RiskLevel, RiskOutcome, TargetSubject,
};
use nathac_llm::{LLMClient, LLMError, LLMRequest, LLMResponse};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Scripted behavior for one subject
#[derive(Debug, Clone)]
pub enum Script {
    /// Return this outcome after an optional delay
    Succeed(RiskOutcome, Duration),
    /// Fail as a vendor error
    ProviderFailure(String),
    /// Fail as a per-call timeout
    Timeout,
    /// Fail as unrecoverable model output
    Malformed(String),
}

/// Analyzer whose answers are scripted per subject code
pub struct ScriptedAnalyzer {
    scripts: HashMap<String, Script>,
    fallback: Option<Script>,
    calls: AtomicUsize,
}

impl ScriptedAnalyzer {
    pub fn new() -> Self {
        Self {
            scripts: HashMap::new(),
            fallback: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Script applied to subjects without a dedicated script
    pub fn always(script: Script) -> Self {
        Self {
            fallback: Some(script),
            ..Self::new()
        }
    }

    pub fn with(mut self, subject_code: &str, script: Script) -> Self {
        self.scripts.insert(subject_code.to_string(), script);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RiskAnalyzer for ScriptedAnalyzer {
    fn provider(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }

    async fn analyze(
        &self,
        subject: &TargetSubject,
        _history: &[AcademicRecord],
    ) -> nathac_analysis::Result<RiskOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let script = self
            .scripts
            .get(&subject.subject_code)
            .or(self.fallback.as_ref())
            .cloned()
            .unwrap_or_else(|| {
                Script::Succeed(low_risk(&subject.subject_code), Duration::ZERO)
            });

        match script {
            Script::Succeed(outcome, delay) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                Ok(outcome)
            }
            Script::ProviderFailure(msg) => Err(AnalysisError::Provider(
                LLMError::ApiCallFailed(msg),
            )),
            Script::Timeout => Err(AnalysisError::Timeout(Duration::from_secs(30))),
            Script::Malformed(raw) => Err(AnalysisError::MalformedOutput {
                reason: "no JSON object found".to_string(),
                snippet: raw,
            }),
        }
    }
}

/// Factory handing out one shared analyzer for every provider
pub struct SharedFactory {
    analyzer: Arc<dyn RiskAnalyzer>,
    pub builds: AtomicUsize,
}

impl SharedFactory {
    pub fn new(analyzer: Arc<dyn RiskAnalyzer>) -> Self {
        Self {
            analyzer,
            builds: AtomicUsize::new(0),
        }
    }

    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl AnalyzerFactory for SharedFactory {
    fn build(&self, _kind: ProviderKind) -> nathac_analysis::Result<Arc<dyn RiskAnalyzer>> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(self.analyzer.clone())
    }
}

/// LLM client answering by the subject code found in the prompt
///
/// Subjects without a route never answer, so callers hit their timeout.
pub struct RoutingClient {
    routes: HashMap<String, String>,
}

impl RoutingClient {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
        }
    }

    pub fn route(mut self, subject_code: &str, response: &str) -> Self {
        self.routes
            .insert(format!("Code: {}\n", subject_code), response.to_string());
        self
    }
}

#[async_trait]
impl LLMClient for RoutingClient {
    async fn call(&self, request: LLMRequest) -> nathac_llm::Result<LLMResponse> {
        for (marker, response) in &self.routes {
            if request.prompt.contains(marker.as_str()) {
                return Ok(LLMResponse::new(response.clone(), request.model));
            }
        }
        std::future::pending::<()>().await;
        unreachable!("pending future never resolves")
    }

    fn name(&self) -> &str {
        "routing"
    }
}

pub fn low_risk(subject_code: &str) -> RiskOutcome {
    RiskOutcome {
        subject_code: subject_code.to_string(),
        subject_name: None,
        risk_level: RiskLevel::Low,
        key_signals: vec![KeySignal::new("SolidBasics", "Prerequisites passed comfortably")],
        risk_drivers: Vec::new(),
        recommended_focus: vec!["keep current study routine".to_string()],
    }
}

pub fn math201_high_risk() -> RiskOutcome {
    RiskOutcome {
        subject_code: "MATH201".to_string(),
        subject_name: None,
        risk_level: RiskLevel::High,
        key_signals: vec![KeySignal::new(
            "WeakAlgebra",
            "External mark in MATH101 well below the cohort",
        )],
        risk_drivers: vec!["low MATH101 score".to_string()],
        recommended_focus: vec!["review algebra".to_string()],
    }
}

pub fn math201() -> TargetSubject {
    TargetSubject::new("MATH201").with_dependency(DependencySignal {
        subject_code: "MATH101".to_string(),
        subject_name: None,
        weight: 5.0,
        reason: Some("Algebraic manipulation is assumed".to_string()),
    })
}

pub fn phy201() -> TargetSubject {
    TargetSubject::new("PHY201")
}

pub fn math101_record() -> AcademicRecord {
    AcademicRecord {
        subject_code: "MATH101".to_string(),
        subject_name: Some("Calculus I".to_string()),
        semester: Some(1),
        internal: vec![InternalScore {
            name: "Midterm".to_string(),
            score: 9.0,
            max: Some(25.0),
        }],
        external: Some(ExternalScore {
            score: 21.0,
            max: Some(75.0),
        }),
        final_grade: Some("D".to_string()),
    }
}

pub fn subject_codes(outcomes: &[RiskOutcome]) -> Vec<&str> {
    outcomes.iter().map(|o| o.subject_code.as_str()).collect()
}
