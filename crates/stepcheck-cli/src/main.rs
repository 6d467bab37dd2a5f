//! stepcheck CLI - Scenario-driven API checks with symbolic expectations

mod storage;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use stepcheck_core::expect::{Expected, Matcher};
use stepcheck_core::fixture::normalize_cell;
use stepcheck_core::{Config, Scenario, generate_schema};
use stepcheck_runner::ApiSession;

#[derive(Parser)]
#[command(name = "stepcheck")]
#[command(about = "Scenario-driven API checks with symbolic expectations")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Strict mode (undeclared step status must be 2xx). Use --no-strict to disable.
    #[arg(long, global = true, default_value_t = true, action = ArgAction::Set)]
    strict: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file against the configured API
    Run {
        /// Scenario file (TOML, or JSON by extension)
        scenario: PathBuf,

        /// Config file (default: .stepcheck.toml)
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Evaluate one expectation token against one JSON value
    Check {
        /// Expectation token, e.g. 'UUID', 'ARRAY[3]', 'NOW[+5mins]'
        token: String,

        /// Actual value (JSON, or a plain string)
        value: String,
    },

    /// Initialize config and example scenario files
    Init,

    /// Export JSON Schema for the scenario outcome format
    Schema,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Run { scenario, config } => {
            // Load config
            let cfg = if let Some(path) = config {
                Config::load(Path::new(&path))?
            } else {
                Config::load_default()?
            };

            let scenario = Scenario::load(&scenario)?;

            if cli.output != OutputFormat::Silent {
                eprintln!("Config:");
                eprintln!("  base_url: {}", cfg.base_url);
                if !cfg.headers.is_empty() {
                    eprintln!("  headers:  {} configured", cfg.headers.len());
                }
                eprintln!("  auth:     {}", if cfg.auth.is_some() { "oauth" } else { "none" });
                eprintln!("  scenario: {} ({} steps)", scenario.name, scenario.steps.len());
                eprintln!();
            }

            let mut session = ApiSession::new(cfg.clone())?.with_strict_status(cli.strict);
            if cfg.auth.is_some() {
                session.login()?;
            }

            let run_start = Instant::now();
            let outcome = session.run_scenario(&scenario);
            let duration_secs = run_start.elapsed().as_secs_f64();

            // Report errors
            if !outcome.errors.is_empty() && cli.output != OutputFormat::Silent {
                eprintln!("Errors:");
                for err in &outcome.errors {
                    eprintln!("  - {err}");
                }
                eprintln!();
            }

            match cli.output {
                OutputFormat::Terminal => {
                    for step in &outcome.steps {
                        let icon = if step.is_pass() { "PASS" } else { "FAIL" };
                        println!(
                            "{icon} {} -> {} ({}ms)",
                            step.step, step.status, step.latency_ms
                        );
                        if !step.status_ok {
                            match step.expected_status {
                                Some(want) => println!("     expected status {want}"),
                                None => println!("     expected a 2xx status"),
                            }
                        }
                        if !step.report.is_pass() || cli.verbose {
                            for line in format!("{}", step.report).lines() {
                                println!("     {line}");
                            }
                        }
                    }

                    let icon = if outcome.is_pass() { "PASS" } else { "FAIL" };
                    println!(
                        "\n{icon}: {}/{} steps passed",
                        outcome.passed_steps, outcome.total_steps
                    );
                    println!("  Exit code: {}", outcome.exit_code());
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&outcome)?);
                }
                OutputFormat::Silent => {}
            }

            // Persist report to ~/.stepcheck/reports/
            let report_data = storage::ReportData {
                config: &cfg,
                outcome: &outcome,
                duration_secs,
            };
            match storage::save_report(&report_data) {
                Ok(path) => {
                    if cli.output != OutputFormat::Silent {
                        eprintln!("Report saved: {}", path.display());
                    }
                }
                Err(e) => {
                    eprintln!("Warning: failed to save report: {e}");
                }
            }

            Ok(outcome.exit_code())
        }

        Commands::Check { token, value } => {
            let expected = Expected::parse(&normalize_cell(&token))?;
            let actual = normalize_cell(&value);

            match Matcher::new().check(&expected, &actual) {
                Ok(()) => {
                    match cli.output {
                        OutputFormat::Terminal => println!("PASS: {} matches {token}", actual),
                        OutputFormat::Json => {
                            println!("{}", serde_json::json!({"pass": true}))
                        }
                        OutputFormat::Silent => {}
                    }
                    Ok(0)
                }
                Err(mismatch) => {
                    match cli.output {
                        OutputFormat::Terminal => println!("FAIL: {mismatch}"),
                        OutputFormat::Json => println!(
                            "{}",
                            serde_json::json!({"pass": false, "mismatch": mismatch})
                        ),
                        OutputFormat::Silent => {}
                    }
                    Ok(1)
                }
            }
        }

        Commands::Init => {
            let config_path = Path::new(".stepcheck.toml");
            if config_path.exists() {
                eprintln!("{} already exists, leaving it alone", config_path.display());
            } else {
                std::fs::write(config_path, Config::example())?;
                println!("Created {}", config_path.display());
            }

            let scenario_path = Path::new("scenario.example.toml");
            if scenario_path.exists() {
                eprintln!("{} already exists, leaving it alone", scenario_path.display());
            } else {
                std::fs::write(scenario_path, Scenario::example())?;
                println!("Created {}", scenario_path.display());
            }

            Ok(0)
        }

        Commands::Schema => {
            println!("{}", generate_schema());
            Ok(0)
        }
    }
}
