//! Request-level entry point wrapping the orchestrator

use crate::config::LlmSettings;
use crate::error::Result;
use crate::models::{AnalysisResponse, AnalyzeRequest};
use crate::orchestrator::Orchestrator;
use crate::registry::ProviderRegistry;
use std::sync::Arc;
use uuid::Uuid;

/// Turns an [`AnalyzeRequest`] into an [`AnalysisResponse`]
pub struct AnalysisService {
    orchestrator: Orchestrator,
}

impl AnalysisService {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self { orchestrator }
    }

    /// Build a service over the real vendor clients
    pub fn from_settings(settings: LlmSettings) -> Self {
        let scope = settings.history_scope;
        let registry = Arc::new(ProviderRegistry::new(settings));
        Self::new(Orchestrator::new(registry).with_history_scope(scope))
    }

    /// Run a full analysis request
    ///
    /// Returns an error only when the requested provider cannot be resolved.
    pub async fn analyze(&self, request: &AnalyzeRequest) -> Result<AnalysisResponse> {
        let student_id = &request.student.student_id;
        let subjects = &request.dependencies.subjects_to_predict;

        tracing::info!(
            student = %student_id,
            provider = %request.model,
            subjects = subjects.len(),
            "Analysis request received"
        );

        let outcomes = self
            .orchestrator
            .run(subjects, &request.student.academic_history, &request.model)
            .await
            .map_err(|e| {
                tracing::error!(student = %student_id, error = %e, "Analysis failed");
                e
            })?;

        let response = AnalysisResponse {
            analysis_id: Uuid::new_v4().to_string(),
            student_id: student_id.clone(),
            subjects_requested: subjects.iter().map(|s| s.subject_code.clone()).collect(),
            subject_outcomes: outcomes,
        };

        tracing::info!(
            student = %student_id,
            analysis_id = %response.analysis_id,
            subjects = response.subject_outcomes.len(),
            "Analysis completed"
        );

        Ok(response)
    }
}
