//! Field verification reports
//!
//! One [`Report`] per expectation table: how many fields were checked, how
//! many passed, and the mismatch diagnostics for the rest.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::matcher::Mismatch;

/// A mismatch tied to the field it was checked on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FieldMismatch {
    /// Dotted field path, e.g. `user.id`
    pub field: String,
    #[serde(flatten)]
    pub mismatch: Mismatch,
}

/// Aggregated result of verifying an expectation table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Report {
    /// Fields checked
    pub total: usize,
    /// Fields that matched
    pub passed: usize,
    /// Diagnostics for the fields that did not
    pub mismatches: Vec<FieldMismatch>,
}

impl Report {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_pass(&mut self) {
        self.total += 1;
        self.passed += 1;
    }

    pub fn record_mismatch(&mut self, field: &str, mismatch: Mismatch) {
        self.total += 1;
        self.mismatches.push(FieldMismatch {
            field: field.to_string(),
            mismatch,
        });
    }

    /// True when every checked field matched.
    #[must_use]
    pub fn is_pass(&self) -> bool {
        self.mismatches.is_empty()
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: Report) {
        self.total += other.total;
        self.passed += other.passed;
        self.mismatches.extend(other.mismatches);
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} fields matched", self.passed, self.total)?;
        for fm in &self.mismatches {
            write!(f, "\n  {}: {}", fm.field, fm.mismatch)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_mismatch() -> Mismatch {
        Mismatch {
            expected: "NULL".to_string(),
            actual: json!(7),
            reason: "value is not null".to_string(),
        }
    }

    #[test]
    fn empty_report_passes() {
        let report = Report::new();
        assert!(report.is_pass());
        assert_eq!(report.total, 0);
    }

    #[test]
    fn record_and_judge() {
        let mut report = Report::new();
        report.record_pass();
        report.record_mismatch("deleted_at", sample_mismatch());

        assert!(!report.is_pass());
        assert_eq!(report.total, 2);
        assert_eq!(report.passed, 1);
        assert_eq!(report.mismatches[0].field, "deleted_at");
    }

    #[test]
    fn merge_accumulates() {
        let mut a = Report::new();
        a.record_pass();
        let mut b = Report::new();
        b.record_mismatch("x", sample_mismatch());

        a.merge(b);
        assert_eq!(a.total, 2);
        assert_eq!(a.passed, 1);
        assert_eq!(a.mismatches.len(), 1);
    }

    #[test]
    fn display_lists_mismatches() {
        let mut report = Report::new();
        report.record_pass();
        report.record_mismatch("deleted_at", sample_mismatch());

        let text = format!("{report}");
        assert!(text.contains("1/2 fields matched"));
        assert!(text.contains("deleted_at"));
        assert!(text.contains("value is not null"));
    }

    #[test]
    fn serialization_roundtrip() {
        let mut report = Report::new();
        report.record_mismatch("id", sample_mismatch());

        let json = serde_json::to_string(&report).unwrap();
        let parsed: Report = serde_json::from_str(&json).unwrap();
        assert_eq!(report, parsed);
    }
}
