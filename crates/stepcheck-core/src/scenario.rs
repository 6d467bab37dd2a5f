//! Scenario files: ordered HTTP steps with body and expectation tables
//!
//! The file-level serialization of a BDD scenario. Each step sends one
//! request and verifies the response body against an expectation table.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::fixture::FieldRow;

/// A named scenario: ordered steps against one API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name, used in reports
    pub name: String,

    /// Steps executed in order
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One request/verify step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// HTTP method, e.g. "POST"
    pub method: String,

    /// Request path appended to the configured base URL
    pub path: String,

    /// Expected response status; unset means any status passes
    #[serde(default)]
    pub status: Option<u16>,

    /// Request body table (field/value rows); empty means no body
    #[serde(default)]
    pub body: Vec<FieldRow>,

    /// Expectation table verified against the response body
    #[serde(default)]
    pub expect: Vec<FieldRow>,
}

impl Step {
    /// Step label for reports, e.g. "POST /pipelines"
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

impl Scenario {
    /// Load a scenario from file (TOML, or JSON by extension)
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ScenarioError::Io(path.to_path_buf(), e.to_string()))?;

        if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content).map_err(|e| ScenarioError::Parse(e.to_string()))
        } else {
            toml::from_str(&content).map_err(|e| ScenarioError::Parse(e.to_string()))
        }
    }

    /// Example scenario file
    pub fn example() -> &'static str {
        r#"# stepcheck scenario
name = "create and fetch a pipeline"

[[steps]]
method = "POST"
path = "/pipelines"
status = 201
body = [
    { field = "name", value = "Deploy dashboard" },
    { field = "enabled", value = "true" },
    { field = "interval", value = "300" },
]
expect = [
    { field = "id", value = "UUID" },
    { field = "name", value = "Deploy dashboard" },
    { field = "deleted_at", value = "NULL" },
    { field = "created_at", value = "NOW[+0secs]" },
]

[[steps]]
method = "GET"
path = "/pipelines"
status = 200
expect = [
    { field = "items", value = "ARRAY[1]" },
    { field = "items.0.enabled", value = "BOOLEAN[TRUE]" },
]
"#
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("Cannot read {0}: {1}")]
    Io(PathBuf, String),
    #[error("Parse error: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn example_scenario_parses() {
        let scenario: Scenario = toml::from_str(Scenario::example()).unwrap();
        assert_eq!(scenario.name, "create and fetch a pipeline");
        assert_eq!(scenario.steps.len(), 2);

        let create = &scenario.steps[0];
        assert_eq!(create.label(), "POST /pipelines");
        assert_eq!(create.status, Some(201));
        assert_eq!(create.body.len(), 3);
        assert_eq!(create.expect[0].field, "id");
        assert_eq!(create.expect[0].value, "UUID");

        let list = &scenario.steps[1];
        assert!(list.body.is_empty());
        assert_eq!(list.expect[1].field, "items.0.enabled");
    }

    #[test]
    fn minimal_step_defaults() {
        let scenario: Scenario = toml::from_str(
            r#"
name = "health"

[[steps]]
method = "GET"
path = "/health"
"#,
        )
        .unwrap();

        let step = &scenario.steps[0];
        assert_eq!(step.status, None);
        assert!(step.body.is_empty());
        assert!(step.expect.is_empty());
    }

    #[test]
    fn load_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.toml");
        std::fs::write(&path, Scenario::example()).unwrap();

        let scenario = Scenario::load(&path).unwrap();
        assert_eq!(scenario.steps.len(), 2);
    }

    #[test]
    fn load_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scenario.json");
        std::fs::write(
            &path,
            r#"{"name": "json scenario", "steps": [{"method": "GET", "path": "/x"}]}"#,
        )
        .unwrap();

        let scenario = Scenario::load(&path).unwrap();
        assert_eq!(scenario.name, "json scenario");
    }

    #[test]
    fn load_missing_file_error() {
        let err = Scenario::load(Path::new("/nonexistent/scenario.toml"));
        assert!(err.is_err());
    }

    #[test]
    fn load_invalid_toml_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "steps = not valid").unwrap();

        let err = Scenario::load(&path).unwrap_err();
        assert!(matches!(err, ScenarioError::Parse(_)));
    }
}
