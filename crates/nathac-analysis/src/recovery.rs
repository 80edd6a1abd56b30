//! Recovery of structured risk outcomes from raw model text
//!
//! Models are told to answer with bare JSON but routinely wrap it in code
//! fences or surround it with commentary. Recovery tries, in order:
//! 1. The whole text as JSON
//! 2. The text with leading/trailing code fences removed
//! 3. Each balanced `{...}` span, first to last
//!
//! Each candidate is deserialized straight into [`RiskOutcome`], so a
//! candidate that parses as JSON but misses a required field or carries an
//! unsupported risk level is rejected like any other parse failure.

use crate::error::{AnalysisError, Result};
use crate::models::RiskOutcome;

/// Maximum number of characters of the raw text kept in a failure snippet
pub const SNIPPET_LEN: usize = 200;

/// Recover a validated [`RiskOutcome`] from model output
pub fn recover(raw_text: &str) -> Result<RiskOutcome> {
    let trimmed = raw_text.trim();

    if trimmed.is_empty() {
        return Err(malformed("empty response", raw_text));
    }

    let mut last_error = match parse_candidate(trimmed) {
        Ok(outcome) => return Ok(outcome),
        Err(e) => e,
    };

    if let Some(unfenced) = strip_code_fence(trimmed) {
        match parse_candidate(unfenced) {
            Ok(outcome) => return Ok(outcome),
            Err(e) => last_error = e,
        }
    }

    // Leading commentary may itself contain braces, so every balanced span
    // is a candidate; the first span's error is the one reported
    let mut span_error: Option<String> = None;
    for span in balanced_objects(trimmed) {
        match parse_candidate(span) {
            Ok(outcome) => return Ok(outcome),
            Err(e) => {
                span_error.get_or_insert(e);
            }
        }
    }

    match span_error {
        Some(e) => Err(malformed(&e, raw_text)),
        None if trimmed.contains('{') => Err(malformed(
            &format!("unbalanced JSON object ({})", last_error),
            raw_text,
        )),
        None => Err(malformed("no JSON object found", raw_text)),
    }
}

fn parse_candidate(candidate: &str) -> std::result::Result<RiskOutcome, String> {
    serde_json::from_str::<RiskOutcome>(candidate).map_err(|e| e.to_string())
}

/// Remove a ```` ``` ```` / ```` ```json ```` opening line and a closing fence
fn strip_code_fence(content: &str) -> Option<&str> {
    let after_open = content.strip_prefix("```")?;

    // Skip the info string (e.g. "json") up to the end of the opening line
    let body = match after_open.find('\n') {
        Some(pos) => &after_open[pos + 1..],
        None => after_open,
    };

    let body = body.trim_end();
    let body = body.strip_suffix("```").unwrap_or(body);

    Some(body.trim())
}

/// Balanced `{...}` spans, one per opening brace, in order of position
fn balanced_objects(content: &str) -> impl Iterator<Item = &str> + '_ {
    content
        .match_indices('{')
        .filter_map(move |(start, _)| balanced_span(content, start))
}

/// Span from the `{` at `start` to its matching `}`, skipping braces inside strings
fn balanced_span(content: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in content[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&content[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

fn malformed(reason: &str, raw_text: &str) -> AnalysisError {
    AnalysisError::MalformedOutput {
        reason: reason.to_string(),
        snippet: snippet(raw_text),
    }
}

fn snippet(raw_text: &str) -> String {
    let trimmed = raw_text.trim();
    if trimmed.chars().count() <= SNIPPET_LEN {
        return trimmed.to_string();
    }
    let cut: String = trimmed.chars().take(SNIPPET_LEN).collect();
    format!("{}...", cut)
}
