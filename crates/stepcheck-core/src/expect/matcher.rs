//! Expectation matching against actual response values

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::report::Report;
use super::token::{Expected, TokenError};
use crate::fixture::{FieldRow, lookup_path, normalize_cell};

/// Default absolute tolerance for `APPROXIMATELY(n)`.
pub const DEFAULT_TOLERANCE: f64 = 80.0;

/// Default window in milliseconds for `NOW[...]` comparisons.
pub const DEFAULT_TIME_WINDOW_MS: i64 = 500;

/// A failed expectation with diagnostic context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Mismatch {
    /// The expectation in token form, e.g. `ARRAY[3]`
    pub expected: String,
    /// The actual value found
    pub actual: Value,
    /// Why the match failed
    pub reason: String,
}

impl std::fmt::Display for Mismatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "expected {}, got {}: {}",
            self.expected, self.actual, self.reason
        )
    }
}

/// Matches parsed expectations against actual JSON values.
#[derive(Debug, Clone)]
pub struct Matcher {
    tolerance: f64,
    time_window_ms: i64,
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            time_window_ms: DEFAULT_TIME_WINDOW_MS,
        }
    }
}

impl Matcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the `APPROXIMATELY` tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Override the `NOW` comparison window.
    #[must_use]
    pub fn with_time_window_ms(mut self, window_ms: i64) -> Self {
        self.time_window_ms = window_ms;
        self
    }

    /// Match one expectation against one actual value.
    ///
    /// # Errors
    ///
    /// Returns a [`Mismatch`] describing the failure.
    pub fn check(&self, expected: &Expected, actual: &Value) -> Result<(), Mismatch> {
        self.check_at(expected, actual, Utc::now())
    }

    /// Verify an expectation table against a response body.
    ///
    /// Each row's field is looked up by dotted path; missing fields and
    /// malformed tokens are reported as mismatches rather than aborting the
    /// table.
    #[must_use]
    pub fn verify_table(&self, body: &Value, rows: &[FieldRow]) -> Report {
        let mut report = Report::new();
        for row in rows {
            let cell = normalize_cell(&row.value);
            let expected = match Expected::parse(&cell) {
                Ok(e) => e,
                Err(TokenError::Malformed(token)) => {
                    report.record_mismatch(
                        &row.field,
                        Mismatch {
                            expected: token,
                            actual: Value::Null,
                            reason: "malformed expectation token".to_string(),
                        },
                    );
                    continue;
                }
            };

            let Some(actual) = lookup_path(body, &row.field) else {
                report.record_mismatch(
                    &row.field,
                    Mismatch {
                        expected: expected.token(),
                        actual: Value::Null,
                        reason: "field not present in response body".to_string(),
                    },
                );
                continue;
            };

            match self.check(&expected, actual) {
                Ok(()) => report.record_pass(),
                Err(m) => report.record_mismatch(&row.field, m),
            }
        }
        report
    }

    fn check_at(
        &self,
        expected: &Expected,
        actual: &Value,
        now: DateTime<Utc>,
    ) -> Result<(), Mismatch> {
        let fail = |reason: &str| {
            Err(Mismatch {
                expected: expected.token(),
                actual: actual.clone(),
                reason: reason.to_string(),
            })
        };

        match expected {
            Expected::Null => match actual {
                Value::Null => Ok(()),
                _ => fail("value is not null"),
            },
            Expected::Uuid => match actual.as_str() {
                Some(s) if is_hyphenated_uuid(s) => Ok(()),
                Some(_) => fail("string is not a hyphenated UUID"),
                None => fail("value is not a string"),
            },
            Expected::AnyString => match actual {
                Value::String(_) => Ok(()),
                _ => fail("value is not a string"),
            },
            Expected::AnyNumber => match actual {
                Value::Number(_) => Ok(()),
                _ => fail("value is not a number"),
            },
            Expected::AnyObject => match actual {
                Value::Object(_) => Ok(()),
                _ => fail("value is not an object"),
            },
            Expected::Boolean(want) => match actual.as_bool() {
                Some(b) if b == *want => Ok(()),
                Some(_) => fail("boolean has the wrong value"),
                None => fail("value is not a boolean"),
            },
            Expected::ArrayLen(want) => match actual.as_array() {
                Some(items) if items.len() == *want => Ok(()),
                Some(items) => {
                    let len = items.len();
                    fail(&format!("array has {len} elements"))
                }
                None => fail("value is not an array"),
            },
            Expected::Approximately(target) => match actual.as_f64() {
                Some(n) if (n - target).abs() <= self.tolerance => Ok(()),
                Some(_) => fail(&format!("number is not within {} of {target}", self.tolerance)),
                None => fail("value is not a number"),
            },
            Expected::DateTime => match actual.as_str() {
                Some(s) if parse_datetime(s).is_some() => Ok(()),
                Some(_) => fail("string is not a parseable date-time"),
                None => fail("value is not a string"),
            },
            Expected::Date => match actual.as_str() {
                Some(s) if parse_date(s).is_some() => Ok(()),
                Some(_) => fail("string is not a YYYY-MM-DD date"),
                None => fail("value is not a string"),
            },
            Expected::Time => match actual.as_str() {
                Some(s) if parse_time(s).is_some() => Ok(()),
                Some(_) => fail("string is not a HH:MM:SS time"),
                None => fail("value is not a string"),
            },
            Expected::Now { amount, unit } => {
                let Some(s) = actual.as_str() else {
                    return fail("value is not a string");
                };
                let Some(dt) = parse_datetime(s) else {
                    return fail("string is not a parseable date-time");
                };
                let offset = amount.saturating_mul(unit.seconds());
                let reference = TimeDelta::try_seconds(offset)
                    .and_then(|delta| now.checked_add_signed(delta));
                let Some(reference) = reference else {
                    return fail("offset is out of range");
                };
                let delta_ms = (dt - reference).num_milliseconds().abs();
                if delta_ms <= self.time_window_ms {
                    Ok(())
                } else {
                    fail(&format!(
                        "timestamp is {delta_ms}ms from the expected instant (window {}ms)",
                        self.time_window_ms
                    ))
                }
            }
            Expected::Literal(want) => {
                if actual == want {
                    Ok(())
                } else {
                    fail("value does not equal the expected literal")
                }
            }
        }
    }
}

/// Hyphenated 8-4-4-4-12 UUID check, case-insensitive.
///
/// `Uuid::try_parse` also accepts simple/braced/urn forms; only the 36-char
/// hyphenated form counts here.
fn is_hyphenated_uuid(s: &str) -> bool {
    s.len() == 36 && uuid::Uuid::try_parse(s).is_ok()
}

/// Parse a date-time string: RFC 3339 first, then common naive forms,
/// then a bare date. Naive values are taken as UTC.
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Some(naive.and_utc());
        }
    }
    parse_date(s).map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M:%S%.f")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .ok()
}
