//! Academic records, target subjects and risk outcomes

use crate::error::FailureClass;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// One named internal assessment (mid-term, assignment, lab, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InternalScore {
    pub name: String,
    pub score: f64,
    /// Maximum achievable mark; absent or zero means no meaningful ratio
    #[serde(default)]
    pub max: Option<f64>,
}

/// End-of-term examination mark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalScore {
    pub score: f64,
    #[serde(default)]
    pub max: Option<f64>,
}

/// One completed course in a student's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicRecord {
    pub subject_code: String,
    #[serde(default)]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub semester: Option<u32>,
    #[serde(default)]
    pub internal: Vec<InternalScore>,
    #[serde(default)]
    pub external: Option<ExternalScore>,
    #[serde(default)]
    pub final_grade: Option<String>,
}

/// A prerequisite relationship feeding into a target subject
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DependencySignal {
    /// Prerequisite subject identifier
    pub subject_code: String,
    #[serde(default)]
    pub subject_name: Option<String>,
    /// Strength of the dependency, see [`crate::prompt::WEIGHT_SCALE_MAX`]
    pub weight: f64,
    #[serde(default)]
    pub reason: Option<String>,
}

/// A subject whose risk should be assessed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetSubject {
    pub subject_code: String,
    #[serde(default)]
    pub subject_name: Option<String>,
    #[serde(default)]
    pub dependencies: Vec<DependencySignal>,
}

impl TargetSubject {
    /// Create a subject with no dependencies
    pub fn new(subject_code: impl Into<String>) -> Self {
        Self {
            subject_code: subject_code.into(),
            subject_name: None,
            dependencies: Vec::new(),
        }
    }

    /// Set display name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.subject_name = Some(name.into());
        self
    }

    /// Append a dependency signal
    pub fn with_dependency(mut self, dependency: DependencySignal) -> Self {
        self.dependencies.push(dependency);
        self
    }
}

/// Risk level of a subject outcome
///
/// Models are asked for `Low`, `Medium` or `High`; `Unknown` marks a
/// degraded outcome. Deserialization is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Unknown,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "unknown" => Ok(Self::Unknown),
            _ => Err(format!("unsupported risk level '{}'", s)),
        }
    }
}

impl<'de> Deserialize<'de> for RiskLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A notable observation backing a risk assessment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeySignal {
    pub signal: String,
    pub description: String,
}

impl KeySignal {
    pub fn new(signal: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            signal: signal.into(),
            description: description.into(),
        }
    }
}

/// Risk assessment for one target subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskOutcome {
    pub subject_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_name: Option<String>,
    pub risk_level: RiskLevel,
    pub key_signals: Vec<KeySignal>,
    pub risk_drivers: Vec<String>,
    pub recommended_focus: Vec<String>,
}

impl RiskOutcome {
    /// Synthesize the `Unknown` outcome used when no valid model answer exists
    pub fn degraded(subject: &TargetSubject, class: FailureClass, detail: &str) -> Self {
        Self {
            subject_code: subject.subject_code.clone(),
            subject_name: subject.subject_name.clone(),
            risk_level: RiskLevel::Unknown,
            key_signals: Vec::new(),
            risk_drivers: vec![format!("{}: {}", class.describe(), detail)],
            recommended_focus: Vec::new(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.risk_level == RiskLevel::Unknown
    }
}

/// Student identity plus course history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentHistory {
    pub student_id: String,
    #[serde(default)]
    pub academic_history: Vec<AcademicRecord>,
}

/// The subjects to assess
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyRequest {
    pub subjects_to_predict: Vec<TargetSubject>,
}

fn default_model() -> String {
    "gemini".to_string()
}

/// Inbound request bundle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub student: StudentHistory,
    pub dependencies: DependencyRequest,
    /// Provider selector (`gemini`, `openai`, `deepseek`)
    #[serde(default = "default_model")]
    pub model: String,
}

/// Outbound response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub analysis_id: String,
    pub student_id: String,
    pub subjects_requested: Vec<String>,
    pub subject_outcomes: Vec<RiskOutcome>,
}
