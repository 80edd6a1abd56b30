//! NATHAC academic risk analysis
//!
//! Assesses a student's per-subject academic risk with an LLM:
//! - [`prompt`]: deterministic prompt for one subject and a course history
//! - [`recovery`]: structured outcome recovery from raw model text
//! - [`analyzer`]: provider adapters behind the [`RiskAnalyzer`] contract
//! - [`registry`]: lazily built, cached adapters keyed by provider
//! - [`orchestrator`]: concurrent per-subject fan-out with failure isolation
//!
//! # Example
//! ```no_run
//! use nathac_analysis::{AnalysisService, AppConfig};
//!
//! # async fn example(request: nathac_analysis::AnalyzeRequest) -> anyhow::Result<()> {
//! let config = AppConfig::load()?;
//! let service = AnalysisService::from_settings(config.llm);
//!
//! let response = service.analyze(&request).await?;
//! for outcome in &response.subject_outcomes {
//!     println!("{}: {}", outcome.subject_code, outcome.risk_level);
//! }
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod recovery;
pub mod registry;
pub mod service;

pub use analyzer::{AnalyzerConfig, FailurePolicy, LlmRiskAnalyzer, RiskAnalyzer};
pub use config::{AppConfig, HistoryScope, LlmSettings, ProviderSettings};
pub use error::{AnalysisError, FailureClass, Result};
pub use models::{
    AcademicRecord, AnalysisResponse, AnalyzeRequest, DependencyRequest, DependencySignal,
    ExternalScore, InternalScore, KeySignal, RiskLevel, RiskOutcome, StudentHistory,
    TargetSubject,
};
pub use orchestrator::{Orchestrator, TaskOutcome};
pub use prompt::build_prompt;
pub use recovery::recover;
pub use registry::{AnalyzerFactory, LlmAnalyzerFactory, ProviderKind, ProviderRegistry};
pub use service::AnalysisService;
