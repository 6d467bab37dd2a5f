//! Interchange types for scenario outcomes
//!
//! The runner fills these in; the CLI serializes them for `--output json`
//! and persisted reports. `stepcheck schema` exports the JSON Schema so
//! other tooling can consume the format.

use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};

use crate::expect::Report;

/// Outcome of one executed step.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct StepOutcome {
    /// Step label, e.g. "POST /pipelines"
    pub step: String,
    /// HTTP status received
    pub status: u16,
    /// Expected status from the scenario file, if declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_status: Option<u16>,
    /// Whether the status matched the expectation (or none was declared)
    pub status_ok: bool,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
    /// Field verification report for the expectation table
    pub report: Report,
}

impl StepOutcome {
    /// Status matched and every field expectation held.
    #[must_use]
    pub fn is_pass(&self) -> bool {
        self.status_ok && self.report.is_pass()
    }
}

/// Outcome of a whole scenario run.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ScenarioOutcome {
    /// Scenario name
    pub scenario: String,
    /// Steps executed
    pub total_steps: usize,
    /// Steps that passed
    pub passed_steps: usize,
    /// Per-step outcomes
    pub steps: Vec<StepOutcome>,
    /// Execution errors (transport failures, invalid methods)
    #[serde(default)]
    pub errors: Vec<String>,
}

impl ScenarioOutcome {
    /// Every step passed and nothing errored.
    #[must_use]
    pub fn is_pass(&self) -> bool {
        self.errors.is_empty() && self.steps.iter().all(StepOutcome::is_pass)
    }

    /// Exit code for the CLI: 0 pass, 1 expectation failures, 3 errors.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if !self.errors.is_empty() {
            3
        } else if self.is_pass() {
            0
        } else {
            1
        }
    }
}

/// Generate the JSON Schema for [`ScenarioOutcome`] as pretty JSON.
#[must_use]
pub fn generate_schema() -> String {
    let schema = schema_for!(ScenarioOutcome);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passing_step() -> StepOutcome {
        StepOutcome {
            step: "GET /health".to_string(),
            status: 200,
            expected_status: Some(200),
            status_ok: true,
            latency_ms: 12,
            report: Report::new(),
        }
    }

    #[test]
    fn outcome_pass() {
        let outcome = ScenarioOutcome {
            scenario: "health".to_string(),
            total_steps: 1,
            passed_steps: 1,
            steps: vec![passing_step()],
            errors: vec![],
        };
        assert!(outcome.is_pass());
        assert_eq!(outcome.exit_code(), 0);
    }

    #[test]
    fn outcome_status_mismatch_fails() {
        let mut step = passing_step();
        step.status = 500;
        step.status_ok = false;

        let outcome = ScenarioOutcome {
            scenario: "health".to_string(),
            total_steps: 1,
            passed_steps: 0,
            steps: vec![step],
            errors: vec![],
        };
        assert!(!outcome.is_pass());
        assert_eq!(outcome.exit_code(), 1);
    }

    #[test]
    fn outcome_errors_exit_three() {
        let outcome = ScenarioOutcome {
            scenario: "health".to_string(),
            total_steps: 1,
            passed_steps: 0,
            steps: vec![],
            errors: vec!["connection refused".to_string()],
        };
        assert_eq!(outcome.exit_code(), 3);
    }

    #[test]
    fn schema_mentions_top_level_type() {
        let schema = generate_schema();
        let parsed: serde_json::Value = serde_json::from_str(&schema).unwrap();
        assert_eq!(
            parsed.get("title").and_then(|v| v.as_str()),
            Some("ScenarioOutcome")
        );
    }
}
