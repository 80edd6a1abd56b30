//! Batch orchestration: one concurrent analysis per subject
//!
//! Per-subject failures never abort the batch. Each failed task is turned
//! into a degraded `Unknown` outcome; only provider resolution errors are
//! returned to the caller.

use crate::config::HistoryScope;
use crate::error::{FailureClass, Result};
use crate::models::{AcademicRecord, RiskOutcome, TargetSubject};
use crate::registry::ProviderRegistry;
use futures::stream::{FuturesUnordered, StreamExt};
use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

/// Result of one subject's analysis task, decided at the task boundary
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Completed(RiskOutcome),
    Failed { class: FailureClass, reason: String },
}

impl From<Result<RiskOutcome>> for TaskOutcome {
    fn from(result: Result<RiskOutcome>) -> Self {
        match result {
            Ok(outcome) => TaskOutcome::Completed(outcome),
            Err(e) => TaskOutcome::Failed {
                class: e.failure_class(),
                reason: e.to_string(),
            },
        }
    }
}

impl TaskOutcome {
    /// Final outcome for `subject`, degrading failures
    pub fn into_outcome(self, subject: &TargetSubject) -> RiskOutcome {
        match self {
            TaskOutcome::Completed(outcome) => outcome,
            TaskOutcome::Failed { class, reason } => RiskOutcome::degraded(subject, class, &reason),
        }
    }
}

/// Fans out per-subject analyses over one provider
pub struct Orchestrator {
    registry: Arc<ProviderRegistry>,
    history_scope: HistoryScope,
}

impl Orchestrator {
    pub fn new(registry: Arc<ProviderRegistry>) -> Self {
        Self {
            registry,
            history_scope: HistoryScope::Full,
        }
    }

    /// Restrict each subject's history
    pub fn with_history_scope(mut self, scope: HistoryScope) -> Self {
        self.history_scope = scope;
        self
    }

    /// Analyze every subject, returning outcomes in request order
    pub async fn run(
        &self,
        subjects: &[TargetSubject],
        history: &[AcademicRecord],
        provider_name: &str,
    ) -> Result<Vec<RiskOutcome>> {
        let analyzer = self.registry.get(provider_name)?;
        let analyzer = analyzer.as_ref();
        let started = Instant::now();

        tracing::info!(
            provider = analyzer.provider(),
            model = analyzer.model_name(),
            subjects = subjects.len(),
            history = history.len(),
            "Starting batch analysis"
        );

        let mut pending: FuturesUnordered<_> = subjects
            .iter()
            .enumerate()
            .map(|(index, subject)| {
                let scoped = self.scoped_history(subject, history);
                async move {
                    let result = analyzer.analyze(subject, &scoped).await;
                    (index, TaskOutcome::from(result))
                }
            })
            .collect();

        // Completion order is arbitrary; place each result by source index
        let mut slots: Vec<Option<TaskOutcome>> = vec![None; subjects.len()];
        while let Some((index, outcome)) = pending.next().await {
            if let TaskOutcome::Failed { class, reason } = &outcome {
                tracing::warn!(
                    provider = analyzer.provider(),
                    subject = %subjects[index].subject_code,
                    failure = class.as_str(),
                    reason = %reason,
                    "Subject analysis degraded"
                );
            }
            slots[index] = Some(outcome);
        }

        let outcomes: Vec<RiskOutcome> = slots
            .into_iter()
            .zip(subjects)
            .map(|(slot, subject)| match slot {
                Some(outcome) => outcome.into_outcome(subject),
                None => RiskOutcome::degraded(
                    subject,
                    FailureClass::Provider,
                    "analysis task did not complete",
                ),
            })
            .collect();

        let degraded = outcomes.iter().filter(|o| o.is_degraded()).count();
        tracing::info!(
            provider = analyzer.provider(),
            subjects = outcomes.len(),
            degraded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Batch analysis completed"
        );

        Ok(outcomes)
    }

    fn scoped_history<'a>(
        &self,
        subject: &TargetSubject,
        history: &'a [AcademicRecord],
    ) -> Cow<'a, [AcademicRecord]> {
        match self.history_scope {
            HistoryScope::Full => Cow::Borrowed(history),
            HistoryScope::Dependencies => {
                let codes: HashSet<&str> = subject
                    .dependencies
                    .iter()
                    .map(|d| d.subject_code.as_str())
                    .collect();
                let filtered: Vec<AcademicRecord> = history
                    .iter()
                    .filter(|r| codes.contains(r.subject_code.as_str()))
                    .cloned()
                    .collect();
                tracing::debug!(
                    subject = %subject.subject_code,
                    filtered = filtered.len(),
                    "Scoped history to dependencies"
                );
                Cow::Owned(filtered)
            }
        }
    }
}
