//! Persistent report storage — `~/.stepcheck/reports/`
//!
//! Every `stepcheck run` is saved regardless of `--output` mode.
//! Directory layout: `{host_port}_{timestamp}_{scenario}/`

use std::path::PathBuf;

use chrono::Utc;

use stepcheck_core::Config;
use stepcheck_core::schema::ScenarioOutcome;

/// Everything needed to persist a run.
pub struct ReportData<'a> {
    pub config: &'a Config,
    pub outcome: &'a ScenarioOutcome,
    pub duration_secs: f64,
}

/// Save a run report to `~/.stepcheck/reports/{host_port}_{timestamp}_{scenario}/`.
///
/// Returns the report directory path on success.
pub fn save_report(data: &ReportData) -> Result<PathBuf, std::io::Error> {
    let base = report_base_dir()?;
    let dir_name = build_dir_name(&data.config.base_url, &data.outcome.scenario);
    let report_dir = base.join(&dir_name);
    std::fs::create_dir_all(&report_dir)?;

    // config.toml — snapshot of the config used, secret redacted
    let mut snapshot = data.config.clone();
    if let Some(auth) = snapshot.auth.as_mut() {
        auth.client_secret = auth.client_secret.as_ref().map(|_| "<redacted>".to_string());
    }
    let config_toml =
        toml::to_string_pretty(&snapshot).map_err(|e| std::io::Error::other(e.to_string()))?;
    std::fs::write(report_dir.join("config.toml"), config_toml)?;

    // outcome.json — full interchange document
    std::fs::write(
        report_dir.join("outcome.json"),
        serde_json::to_string_pretty(data.outcome).unwrap_or_default(),
    )?;

    // summary.json — verdict + stats + metadata
    let summary = serde_json::json!({
        "verdict": {
            "pass": data.outcome.is_pass(),
            "exit_code": data.outcome.exit_code(),
        },
        "stats": {
            "total_steps": data.outcome.total_steps,
            "passed_steps": data.outcome.passed_steps,
            "errors": data.outcome.errors.len(),
        },
        "meta": {
            "timestamp": Utc::now().to_rfc3339(),
            "duration_secs": data.duration_secs,
            "base_url": data.config.base_url,
            "scenario": data.outcome.scenario,
        },
    });
    std::fs::write(
        report_dir.join("summary.json"),
        serde_json::to_string_pretty(&summary).unwrap_or_default(),
    )?;

    Ok(report_dir)
}

fn report_base_dir() -> Result<PathBuf, std::io::Error> {
    let home = std::env::var("HOME")
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::NotFound, "HOME not set"))?;
    Ok(PathBuf::from(home).join(".stepcheck").join("reports"))
}

/// `{host_port}_{timestamp}_{scenario}` e.g. `localhost_3000_20260827T193000_create-pipeline`
fn build_dir_name(base_url: &str, scenario: &str) -> String {
    let host_port = extract_host_port(base_url);
    let ts = Utc::now().format("%Y%m%dT%H%M%S");
    format!("{host_port}_{ts}_{}", slugify(scenario))
}

/// `"http://localhost:3000/path"` → `"localhost_3000"`
fn extract_host_port(url: &str) -> String {
    url.split("://")
        .nth(1)
        .unwrap_or(url)
        .split('/')
        .next()
        .unwrap_or("unknown")
        .replace(':', "_")
}

/// Filesystem-safe scenario name: lowercase, alphanumerics and dashes, capped.
fn slugify(name: &str) -> String {
    let mut slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    slug.truncate(40);
    slug.trim_matches('-').to_string()
}
