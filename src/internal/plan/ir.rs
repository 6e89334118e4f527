use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An ordered list of tool invocations produced by the model.
///
/// Step order is both the execution order and the addressing scheme for
/// `{{prev:N.path}}` references, so a plan is immutable once normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub tool: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Map<String, Value>>,
}

impl Plan {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl Step {
    /// Tool name with any stray `functions.` namespace prefix removed.
    ///
    /// Models that were prompted with function-calling schemas sometimes
    /// echo the namespace back; the registry only knows the bare name.
    pub fn tool_name(&self) -> &str {
        let name = self.tool.trim();
        name.strip_prefix("functions.").unwrap_or(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn step_without_args_deserializes() {
        let step: Step = serde_json::from_value(json!({ "tool": "getCurrentDate" })).unwrap();
        assert_eq!(step.tool, "getCurrentDate");
        assert!(step.args.is_none());
    }

    #[test]
    fn plan_serializes_as_bare_array() {
        let plan = Plan::new(vec![Step {
            tool: "fetchMeetings".to_string(),
            args: None,
        }]);
        let value = serde_json::to_value(&plan).unwrap();
        assert!(value.is_array());
    }

    #[test]
    fn namespace_prefix_is_stripped() {
        let step = Step {
            tool: "functions.fetchMeetings".to_string(),
            args: None,
        };
        assert_eq!(step.tool_name(), "fetchMeetings");

        let plain = Step {
            tool: "fetchMeetings".to_string(),
            args: None,
        };
        assert_eq!(plain.tool_name(), "fetchMeetings");
    }
}
