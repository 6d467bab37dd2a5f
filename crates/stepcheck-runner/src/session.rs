//! HTTP session against the API under test
//!
//! `ApiSession` is the "world" of a scenario: it logs in once, sends JSON
//! requests built from fixture tables, and captures every response (error
//! statuses included) for verification. Transport failures are errors; HTTP
//! 4xx/5xx are data.

use std::collections::HashMap;
use std::time::Instant;

use serde_json::Value;

use stepcheck_core::expect::{Matcher, Report};
use stepcheck_core::fixture::{FieldRow, body_from_rows, lookup_path};
use stepcheck_core::scenario::Scenario;
use stepcheck_core::schema::{ScenarioOutcome, StepOutcome};
use stepcheck_core::Config;

use crate::auth::{AuthError, BearerToken, fetch_token};

/// Captured HTTP response.
#[derive(Debug, Clone)]
pub struct ResponseSnapshot {
    /// HTTP status code
    pub status: u16,
    /// Response headers with printable values
    pub headers: HashMap<String, String>,
    /// Round-trip latency in milliseconds
    pub latency_ms: u64,
    /// Raw body text
    pub body_text: String,
    /// Body parsed as JSON, when it parses
    pub body: Option<Value>,
}

impl ResponseSnapshot {
    /// Look up a dotted path in the parsed body.
    #[must_use]
    pub fn field(&self, path: &str) -> Option<&Value> {
        lookup_path(self.body.as_ref()?, path)
    }
}

/// The scenario world: one authenticated HTTP session.
pub struct ApiSession {
    config: Config,
    client: reqwest::blocking::Client,
    matcher: Matcher,
    strict_status: bool,
    token: Option<BearerToken>,
    last_response: Option<ResponseSnapshot>,
}

impl ApiSession {
    /// Build a session from config.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: Config) -> Result<Self, SessionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SessionError::Client(e.to_string()))?;

        Ok(Self {
            config,
            client,
            matcher: Matcher::new(),
            strict_status: false,
            token: None,
            last_response: None,
        })
    }

    /// Override the expectation matcher (tolerance, time window).
    #[must_use]
    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matcher = matcher;
        self
    }

    /// In strict mode, steps without a declared status must return 2xx.
    /// Otherwise an undeclared status accepts anything.
    #[must_use]
    pub fn with_strict_status(mut self, strict: bool) -> Self {
        self.strict_status = strict;
        self
    }

    /// Fetch and cache a bearer token. A second call with an unexpired
    /// token is a no-op.
    ///
    /// # Errors
    ///
    /// Returns error if no `[auth]` section is configured or the token
    /// fetch fails.
    pub fn login(&mut self) -> Result<(), SessionError> {
        if self.token.as_ref().is_some_and(|t| !t.is_expired()) {
            return Ok(());
        }

        let auth = self
            .config
            .auth
            .as_ref()
            .ok_or(SessionError::AuthNotConfigured)?;
        self.token = Some(fetch_token(&self.client, auth)?);
        Ok(())
    }

    /// Whether a usable bearer token is cached.
    #[must_use]
    pub fn logged_in(&self) -> bool {
        self.token.as_ref().is_some_and(|t| !t.is_expired())
    }

    /// Send a JSON request to `base_url + path` and capture the response.
    ///
    /// An empty row slice means no body. Responses of any status are
    /// captured; only transport failures are errors.
    ///
    /// # Errors
    ///
    /// Returns error for invalid methods and transport failures.
    pub fn send(
        &mut self,
        method: &str,
        path: &str,
        rows: &[FieldRow],
    ) -> Result<&ResponseSnapshot, SessionError> {
        let request = self.build_request(method, path, rows)?;

        let start = Instant::now();
        let response = request.send().map_err(|e| SessionError::Http(e.to_string()))?;
        let latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect();

        let body_text = response.text().unwrap_or_default();
        let body = serde_json::from_str(&body_text).ok();

        let snapshot = ResponseSnapshot {
            status,
            headers,
            latency_ms,
            body_text,
            body,
        };
        Ok(self.last_response.insert(snapshot))
    }

    fn build_request(
        &self,
        method: &str,
        path: &str,
        rows: &[FieldRow],
    ) -> Result<reqwest::blocking::RequestBuilder, SessionError> {
        let method = reqwest::Method::from_bytes(method.as_bytes())
            .map_err(|_| SessionError::InvalidMethod(method.to_string()))?;
        let url = format!("{}{path}", self.config.base_url);

        // Sent on every request, body or not
        let mut request = self
            .client
            .request(method, &url)
            .header("content-type", "application/json");
        for (name, value) in &self.config.headers {
            request = request.header(name, value);
        }
        if let Some(token) = &self.token {
            request = request.header("authorization", token.header_value());
        }
        if !rows.is_empty() {
            request = request.json(&body_from_rows(rows));
        }
        Ok(request)
    }

    /// Last captured response, if any.
    #[must_use]
    pub fn last_response(&self) -> Option<&ResponseSnapshot> {
        self.last_response.as_ref()
    }

    /// Verify an expectation table against the last response body.
    ///
    /// A non-JSON body verifies as JSON null, so every row reports a
    /// missing field rather than silently passing.
    ///
    /// # Errors
    ///
    /// Returns error if no response has been captured yet.
    pub fn verify(&self, rows: &[FieldRow]) -> Result<Report, SessionError> {
        let snapshot = self.last_response.as_ref().ok_or(SessionError::NoResponse)?;
        let body = snapshot.body.clone().unwrap_or(Value::Null);
        Ok(self.matcher.verify_table(&body, rows))
    }

    /// Run every step of a scenario in order.
    ///
    /// A transport failure stops the scenario (later steps usually depend
    /// on earlier ones) and is recorded in the outcome's errors.
    pub fn run_scenario(&mut self, scenario: &Scenario) -> ScenarioOutcome {
        let mut outcome = ScenarioOutcome {
            scenario: scenario.name.clone(),
            total_steps: scenario.steps.len(),
            passed_steps: 0,
            steps: Vec::with_capacity(scenario.steps.len()),
            errors: Vec::new(),
        };

        for step in &scenario.steps {
            let label = step.label();

            let (status, latency_ms, body) = match self.send(&step.method, &step.path, &step.body)
            {
                Ok(snapshot) => (
                    snapshot.status,
                    snapshot.latency_ms,
                    snapshot.body.clone().unwrap_or(Value::Null),
                ),
                Err(e) => {
                    outcome.errors.push(format!("{label}: {e}"));
                    break;
                }
            };

            let status_ok = status_matches(step.status, status, self.strict_status);
            let report = self.matcher.verify_table(&body, &step.expect);

            let step_outcome = StepOutcome {
                step: label,
                status,
                expected_status: step.status,
                status_ok,
                latency_ms,
                report,
            };
            if step_outcome.is_pass() {
                outcome.passed_steps += 1;
            }
            outcome.steps.push(step_outcome);
        }

        outcome
    }
}

/// Does the received status satisfy the step's expectation?
///
/// A declared status must match exactly. An undeclared one accepts
/// anything, unless strict mode requires 2xx.
fn status_matches(expected: Option<u16>, actual: u16, strict: bool) -> bool {
    match expected {
        Some(want) => want == actual,
        None => !strict || (200..300).contains(&actual),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Cannot build HTTP client: {0}")]
    Client(String),
    #[error("Invalid HTTP method '{0}'")]
    InvalidMethod(String),
    #[error("Request failed: {0}")]
    Http(String),
    #[error("No response captured yet")]
    NoResponse,
    #[error("No [auth] section configured")]
    AuthNotConfigured,
    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn unroutable_config() -> Config {
        // Discard port: connection refused, no server required
        Config {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
            ..Config::default()
        }
    }

    #[test]
    fn snapshot_field_lookup() {
        let snapshot = ResponseSnapshot {
            status: 200,
            headers: HashMap::new(),
            latency_ms: 3,
            body_text: r#"{"user": {"id": 7}}"#.to_string(),
            body: Some(json!({"user": {"id": 7}})),
        };

        assert_eq!(snapshot.field("user.id"), Some(&json!(7)));
        assert_eq!(snapshot.field("user.name"), None);
    }

    #[test]
    fn snapshot_field_without_json_body() {
        let snapshot = ResponseSnapshot {
            status: 204,
            headers: HashMap::new(),
            latency_ms: 1,
            body_text: String::new(),
            body: None,
        };
        assert_eq!(snapshot.field("anything"), None);
    }

    #[test]
    fn login_without_auth_section_errors() {
        let mut session = ApiSession::new(Config::default()).unwrap();
        let err = session.login().unwrap_err();
        assert!(matches!(err, SessionError::AuthNotConfigured));
    }

    #[test]
    fn content_type_set_without_body() {
        let session = ApiSession::new(Config::default()).unwrap();
        let request = session.build_request("GET", "/users", &[]).unwrap().build().unwrap();

        assert_eq!(
            request.headers().get("content-type").and_then(|v| v.to_str().ok()),
            Some("application/json")
        );
        assert!(request.body().is_none());
    }

    #[test]
    fn config_headers_attached_to_request() {
        let mut config = Config::default();
        config
            .headers
            .insert("X-Tenant".to_string(), "acme".to_string());
        let session = ApiSession::new(config).unwrap();

        let rows = vec![FieldRow::new("name", "deploy")];
        let request = session.build_request("POST", "/jobs", &rows).unwrap().build().unwrap();

        assert_eq!(
            request.headers().get("X-Tenant").and_then(|v| v.to_str().ok()),
            Some("acme")
        );
        assert!(request.body().is_some());
    }

    #[test]
    fn invalid_method_rejected_before_network() {
        let mut session = ApiSession::new(unroutable_config()).unwrap();
        let err = session.send("GE T", "/x", &[]).unwrap_err();
        assert!(matches!(err, SessionError::InvalidMethod(_)));
    }

    #[test]
    fn verify_before_any_request_errors() {
        let session = ApiSession::new(Config::default()).unwrap();
        let err = session.verify(&[]).unwrap_err();
        assert!(matches!(err, SessionError::NoResponse));
    }

    #[test]
    fn transport_failure_is_error() {
        let mut session = ApiSession::new(unroutable_config()).unwrap();
        let err = session.send("GET", "/health", &[]).unwrap_err();
        assert!(matches!(err, SessionError::Http(_)));
    }

    #[test]
    fn status_declared_must_match() {
        assert!(status_matches(Some(201), 201, true));
        assert!(!status_matches(Some(201), 200, false));
    }

    #[test]
    fn status_undeclared_depends_on_strict() {
        assert!(status_matches(None, 500, false));
        assert!(status_matches(None, 204, true));
        assert!(!status_matches(None, 404, true));
    }

    #[test]
    fn scenario_transport_failure_recorded() {
        let mut session = ApiSession::new(unroutable_config()).unwrap();
        let scenario: Scenario = toml::from_str(
            r#"
name = "unreachable"

[[steps]]
method = "GET"
path = "/health"

[[steps]]
method = "GET"
path = "/never-reached"
"#,
        )
        .unwrap();

        let outcome = session.run_scenario(&scenario);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].starts_with("GET /health"));
        // The scenario stops at the first transport failure
        assert!(outcome.steps.is_empty());
        assert_eq!(outcome.exit_code(), 3);
    }
}
