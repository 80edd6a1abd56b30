//! Prompt construction for per-subject risk analysis
//!
//! The prompt is a pure function of its inputs. Sections always appear in the
//! same order: target subject, dependencies, academic history, output rules.

use crate::models::{AcademicRecord, DependencySignal, TargetSubject};

/// Upper bound of the dependency weight scale shown to the model
pub const WEIGHT_SCALE_MAX: f64 = 10.0;

/// Rendered in place of missing optional fields
pub const UNKNOWN_MARKER: &str = "<unknown>";

/// Rendered when a maximum mark is absent or zero
pub const NOT_APPLICABLE_MARKER: &str = "N/A";

/// Rendered when a subject declares no prerequisites
pub const NO_DEPENDENCIES_MARKER: &str = "NONE: this subject has no declared prerequisites.";

/// Rendered when the student has no course history
pub const NO_HISTORY_MARKER: &str = "NONE: no completed courses on record.";

/// System message sent alongside the prompt to chat-style providers
pub const SYSTEM_MESSAGE: &str = "You are a helpful JSON API.";

const PREAMBLE: &str = r#"You are an academic risk analysis engine.

TASK:
Analyze the student's readiness for the target subject using ONLY the provided dependencies and academic history."#;

const OUTPUT_RULES: &str = r#"## OUTPUT RULES
- Return ONLY valid JSON, no markdown code fences, no commentary.
- "risk_level" MUST be exactly one of "Low", "Medium", "High".
- Every list may be empty but must be present.
- JSON structure:
{
  "subject_code": "{subject_code}",
  "subject_name": "{subject_name}",
  "risk_level": "Low | Medium | High",
  "key_signals": [{"signal": "<short label>", "description": "<explanation>"}],
  "risk_drivers": ["<driver>"],
  "recommended_focus": ["<action>"]
}"#;

/// Build the analysis prompt for one subject
pub fn build_prompt(subject: &TargetSubject, history: &[AcademicRecord]) -> String {
    let mut prompt = String::with_capacity(1024);

    prompt.push_str(PREAMBLE);
    prompt.push_str("\n\n");
    prompt.push_str(&format_subject(subject));
    prompt.push('\n');
    prompt.push_str(&format_dependencies(&subject.dependencies));
    prompt.push('\n');
    prompt.push_str(&format_history(history));
    prompt.push('\n');
    prompt.push_str(
        &OUTPUT_RULES
            .replace("{subject_name}", &json_escape(display_name(&subject.subject_name)))
            .replace("{subject_code}", &json_escape(&subject.subject_code)),
    );
    prompt.push('\n');

    prompt
}

fn format_subject(subject: &TargetSubject) -> String {
    format!(
        "## TARGET SUBJECT\nCode: {}\nName: {}\n",
        subject.subject_code,
        display_name(&subject.subject_name)
    )
}

fn format_dependencies(dependencies: &[DependencySignal]) -> String {
    let mut output = format!(
        "## DEPENDENCIES (weight scale 0-{}, higher means stronger dependency)\n",
        format_number(WEIGHT_SCALE_MAX)
    );

    if dependencies.is_empty() {
        output.push_str(NO_DEPENDENCIES_MARKER);
        output.push('\n');
        return output;
    }

    for dep in dependencies {
        output.push_str(&format!(
            "- {} ({}): weight {}/{}; reason: {}\n",
            dep.subject_code,
            display_name(&dep.subject_name),
            format_weight(dep.weight),
            format_number(WEIGHT_SCALE_MAX),
            dep.reason.as_deref().unwrap_or(UNKNOWN_MARKER),
        ));
    }

    output
}

fn format_history(history: &[AcademicRecord]) -> String {
    let mut output = String::from("## STUDENT ACADEMIC HISTORY\n");

    if history.is_empty() {
        output.push_str(NO_HISTORY_MARKER);
        output.push('\n');
        return output;
    }

    for record in history {
        output.push_str(&format!(
            "- {} ({}) | semester: {} | final grade: {}\n",
            record.subject_code,
            display_name(&record.subject_name),
            record
                .semester
                .map_or(UNKNOWN_MARKER.to_string(), |s| s.to_string()),
            record.final_grade.as_deref().unwrap_or(UNKNOWN_MARKER),
        ));

        let internal = if record.internal.is_empty() {
            "none recorded".to_string()
        } else {
            record
                .internal
                .iter()
                .map(|score| format!("{} {}", score.name, format_mark(score.score, score.max)))
                .collect::<Vec<_>>()
                .join("; ")
        };
        output.push_str(&format!("  internal: {}\n", internal));

        let external = record
            .external
            .as_ref()
            .map_or(UNKNOWN_MARKER.to_string(), |e| format_mark(e.score, e.max));
        output.push_str(&format!("  external: {}\n", external));
    }

    output
}

fn display_name(name: &Option<String>) -> &str {
    match name.as_deref() {
        Some(n) if !n.trim().is_empty() => n,
        _ => UNKNOWN_MARKER,
    }
}

/// `score/max`, with the not-applicable marker instead of a zero or missing max
fn format_mark(score: f64, max: Option<f64>) -> String {
    let max = match max {
        Some(m) if m.is_finite() && m > 0.0 => format_number(m),
        _ => NOT_APPLICABLE_MARKER.to_string(),
    };
    format!("{}/{}", format_number(score), max)
}

fn format_weight(weight: f64) -> String {
    if !weight.is_finite() {
        return UNKNOWN_MARKER.to_string();
    }
    format_number(weight.clamp(0.0, WEIGHT_SCALE_MAX))
}

fn format_number(value: f64) -> String {
    if value.is_finite() {
        value.to_string()
    } else {
        UNKNOWN_MARKER.to_string()
    }
}

fn json_escape(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}
