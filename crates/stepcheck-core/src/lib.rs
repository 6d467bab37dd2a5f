//! stepcheck-core: Fixture normalization and expectation matching for BDD API tests
//!
//! This crate provides the pure logic of the test support layer: normalizing
//! Gherkin data tables into JSON request bodies, parsing symbolic expectation
//! tokens (`NULL`, `UUID`, `ARRAY[3]`, `NOW[+5mins]`, ...), and matching them
//! against actual response values with structured diagnostics.

pub mod config;
pub mod expect;
pub mod fixture;
pub mod scenario;
pub mod schema;

pub use config::{AuthConfig, Config, ConfigError};
pub use expect::{Expected, Matcher, Mismatch, Report, TimeUnit, TokenError};
pub use fixture::{FieldRow, body_from_rows, lookup_path, normalize_rows};
pub use scenario::{Scenario, ScenarioError, Step};
pub use schema::generate_schema;
