//! Conformance report types: results, severity levels, and report aggregation.

use std::fmt;

use serde::Serialize;

/// Maximum number of offending items listed in a result's details.
pub const MAX_DETAILS: usize = 20;

/// Severity level of a conformance check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// The check passed.
    Pass,
    /// The check identified a warning (non-blocking).
    Warning,
    /// The check failed (blocks conformance).
    Failure,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Pass => "PASS",
            Severity::Warning => "WARN",
            Severity::Failure => "FAIL",
        })
    }
}

/// A single conformance check result.
#[derive(Debug, Clone, Serialize)]
pub struct TestResult {
    /// Identifier of the check, e.g. `references/symmetry`.
    pub validator: String,
    /// Human-readable message describing the outcome.
    pub message: String,
    /// Severity of the result.
    pub severity: Severity,
    /// Offending items, at most [`MAX_DETAILS`] of them.
    pub details: Vec<String>,
}

impl TestResult {
    /// Creates a passing result.
    pub fn pass(validator: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(validator, message, Severity::Pass, Vec::new())
    }

    /// Creates a failure result listing the offending items.
    pub fn fail(
        validator: impl Into<String>,
        message: impl Into<String>,
        details: Vec<String>,
    ) -> Self {
        Self::new(validator, message, Severity::Failure, details)
    }

    /// Creates a warning result listing the offending items.
    pub fn warn(
        validator: impl Into<String>,
        message: impl Into<String>,
        details: Vec<String>,
    ) -> Self {
        Self::new(validator, message, Severity::Warning, details)
    }

    fn new(
        validator: impl Into<String>,
        message: impl Into<String>,
        severity: Severity,
        mut details: Vec<String>,
    ) -> Self {
        details.truncate(MAX_DETAILS);
        Self {
            validator: validator.into(),
            message: message.into(),
            severity,
            details,
        }
    }

    /// Returns true if this result represents a failure.
    pub fn is_failure(&self) -> bool {
        self.severity == Severity::Failure
    }
}

/// Aggregated conformance report from all validators.
#[derive(Debug, Default, Serialize)]
pub struct ConformanceReport {
    /// All individual test results across all validators.
    pub results: Vec<TestResult>,
}

impl ConformanceReport {
    /// Creates a new empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a result to this report.
    pub fn push(&mut self, result: TestResult) {
        self.results.push(result);
    }

    /// Extends this report with results from another report.
    pub fn extend(&mut self, other: ConformanceReport) {
        self.results.extend(other.results);
    }

    /// Returns the count of failed checks.
    pub fn failure_count(&self) -> usize {
        self.count(Severity::Failure)
    }

    /// Returns the count of warnings.
    pub fn warning_count(&self) -> usize {
        self.count(Severity::Warning)
    }

    fn count(&self, severity: Severity) -> usize {
        self.results.iter().filter(|r| r.severity == severity).count()
    }

    /// Returns true if all checks passed (no failures).
    pub fn all_passed(&self) -> bool {
        self.failure_count() == 0
    }

    /// Result of the check named `validator`, if it ran.
    pub fn result(&self, validator: &str) -> Option<&TestResult> {
        self.results.iter().find(|r| r.validator == validator)
    }
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for result in &self.results {
            writeln!(f, "[{}] {}: {}", result.severity, result.validator, result.message)?;
            for detail in &result.details {
                writeln!(f, "       {detail}")?;
            }
        }
        write!(
            f,
            "{} checks, {} failures, {} warnings",
            self.results.len(),
            self.failure_count(),
            self.warning_count()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregates_by_severity() {
        let mut report = ConformanceReport::new();
        report.push(TestResult::pass("a/one", "ok"));
        let mut other = ConformanceReport::new();
        other.push(TestResult::warn("a/two", "meh", vec!["x".into()]));
        other.push(TestResult::fail("a/three", "bad", vec!["y".into()]));
        report.extend(other);

        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.warning_count(), 1);
        assert!(!report.all_passed());
        assert_eq!(report.result("a/two").map(|r| r.severity), Some(Severity::Warning));
        assert!(report.to_string().ends_with("3 checks, 1 failures, 1 warnings"));
    }

    #[test]
    fn details_are_capped() {
        let details = (0..100).map(|i| i.to_string()).collect();
        assert_eq!(TestResult::fail("x", "y", details).details.len(), MAX_DETAILS);
    }

    #[test]
    fn serializes_severity_in_lowercase() {
        let mut report = ConformanceReport::new();
        report.push(TestResult::fail("identity/unique", "dup", vec!["ns=2;i=1".into()]));
        let value = serde_json::to_value(&report).unwrap_or_default();
        assert_eq!(value["results"][0]["severity"], "failure");
        assert_eq!(value["results"][0]["details"][0], "ns=2;i=1");
    }
}
