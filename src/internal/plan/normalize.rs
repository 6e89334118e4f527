use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::internal::plan::ir::Plan;

// Greedy span from the first '[' to the last ']' in the text. Models wrap
// plans in prose or markdown fences, and the fence content is the only
// bracketed span that parses as JSON.
static ARRAY_SPAN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[.*\]").expect("array span pattern compiles"));

#[derive(Debug, thiserror::Error)]
pub enum PlanParseError {
    #[error("model output contains no plan array")]
    NoPlanFound,
    #[error("plan array has malformed steps: {0}")]
    MalformedSteps(#[source] serde_json::Error),
}

/// Extract an ordered step list from raw model output.
///
/// The model is not contractually guaranteed to emit pure JSON, so parsing
/// is a tolerance ladder: direct parse, double-encoded re-parse, then the
/// first bracketed span in the surrounding prose. Genuinely unstructured
/// output still fails.
pub fn normalize(raw: &str) -> Result<Plan, PlanParseError> {
    let trimmed = raw.trim();

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        match value {
            Value::Array(_) => return plan_from_value(value),
            // Double-encoded: the model stringified the array a second time.
            Value::String(inner) => {
                if let Ok(reparsed) = serde_json::from_str::<Value>(&inner) {
                    if reparsed.is_array() {
                        return plan_from_value(reparsed);
                    }
                }
            }
            _ => {}
        }
    }

    if let Some(span) = ARRAY_SPAN.find(trimmed) {
        if let Ok(value) = serde_json::from_str::<Value>(span.as_str()) {
            if value.is_array() {
                return plan_from_value(value);
            }
        }
    }

    Err(PlanParseError::NoPlanFound)
}

fn plan_from_value(value: Value) -> Result<Plan, PlanParseError> {
    serde_json::from_value(value).map_err(PlanParseError::MalformedSteps)
}
